use std::error::Error;
use std::io::{self, Write};

use api_types::allocation::EntityType;
use chrono::NaiveDate;
use engine::EntityRef;

pub mod assign;
pub mod categories;
pub mod expenses;
pub mod import;
pub mod recurring;
pub mod targets;
pub mod vendors;

pub type CommandResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Yes/no prompt for destructive actions; default is no.
pub fn confirm(prompt: &str) -> Result<bool, Box<dyn Error + Send + Sync>> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

/// Parses an allocation target written as `TYPE:ID`, e.g. `invoice:12`.
pub fn parse_entity(raw: &str) -> Result<EntityRef, String> {
    let (kind, id) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected TYPE:ID, got \"{raw}\""))?;
    let kind = EntityType::try_from(kind)?;
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|err| format!("invalid entity id \"{id}\": {err}"))?;
    Ok(EntityRef::new(kind, id))
}

/// Parses `TYPE:ID:PCT`. The percentage stays a string; the allocation
/// editor parses and clamps it.
pub fn parse_entity_share(raw: &str) -> Result<(EntityRef, String), String> {
    let (entity, percentage) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected TYPE:ID:PCT, got \"{raw}\""))?;
    Ok((parse_entity(entity)?, percentage.to_string()))
}

pub fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    engine::parse_date(raw).map_err(|err| err.to_string())
}
