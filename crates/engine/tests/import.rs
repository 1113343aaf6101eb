use engine::{ImportContext, ImportOptions, error_report_csv, parse_csv, validate_rows};

fn context() -> ImportContext {
    ImportContext::new(
        ["EUR", "USD"],
        ["Travel", "Software"],
        ["Acme", "Globex"],
        ImportOptions::new("EUR"),
    )
}

/// Ten data rows where the third and seventh are broken: exactly eight
/// survive validation and the two rejects keep their file positions.
#[test]
fn ten_rows_with_two_bad_ones_split_eight_to_two() {
    let file = "\
expense_date,amount,currency,category,vendor,description
2024-01-01,10,EUR,Travel,Acme,one
2024-01-02,20,EUR,Travel,Acme,two
bad-date,30,EUR,Travel,Acme,three
2024-01-04,40,EUR,Software,Globex,four
2024-01-05,50,USD,,,five
2024-01-06,60,EUR,Travel,,six
2024-01-07,not-money,EUR,Travel,Acme,seven
2024-01-08,80,EUR,,Globex,eight
2024-01-09,90,EUR,Software,Acme,nine
2024-01-10,100,EUR,Travel,Acme,ten";

    let rows = parse_csv(file.as_bytes()).unwrap();
    assert_eq!(rows.len(), 10);

    let outcome = validate_rows(&rows, &context());
    assert_eq!(outcome.valid.len(), 8);
    assert_eq!(outcome.invalid.len(), 2);

    // Data row 3 sits at file row 4; data row 7 at file row 8.
    assert_eq!(outcome.invalid[0].row_number, 4);
    assert_eq!(outcome.invalid[1].row_number, 8);
    assert_eq!(outcome.invalid[0].issues[0].field, "expense_date");
    assert_eq!(outcome.invalid[1].issues[0].field, "amount");
}

#[test]
fn zero_and_negative_amounts_are_rejected() {
    let file = "\
expense_date,amount
2024-02-01,0
2024-02-02,-5
2024-02-03,10";

    let rows = parse_csv(file.as_bytes()).unwrap();
    let outcome = validate_rows(&rows, &context());

    assert_eq!(outcome.valid.len(), 1);
    assert_eq!(outcome.valid[0].amount, 10.0);
    assert_eq!(outcome.invalid.len(), 2);
    for reject in &outcome.invalid {
        assert_eq!(reject.issues[0].field, "amount");
        assert_eq!(reject.issues[0].message, "must be greater than zero");
    }
}

#[test]
fn rejected_rows_become_a_downloadable_report() {
    let file = "\
expense_date,amount
2024-01-01,1.2.3
nope,5";

    let rows = parse_csv(file.as_bytes()).unwrap();
    let outcome = validate_rows(&rows, &context());
    let report = String::from_utf8(error_report_csv(&outcome.issues()).unwrap()).unwrap();

    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "row,field,message");
    assert!(lines[1].starts_with("2,amount,"));
    assert!(lines[2].starts_with("3,expense_date,"));
    assert_eq!(lines.len(), 3);
}

#[test]
fn validation_is_re_run_when_options_change() {
    let file = "expense_date,amount,category\n2024-01-01,5,Subscriptions";
    let rows = parse_csv(file.as_bytes()).unwrap();

    let strict = validate_rows(&rows, &context());
    assert_eq!(strict.valid.len(), 0);

    let mut options = ImportOptions::new("EUR");
    options.create_missing_categories = true;
    let lenient = validate_rows(
        &rows,
        &ImportContext::new(["EUR"], ["Travel"], Vec::<String>::new(), options),
    );
    assert_eq!(lenient.valid.len(), 1);
    assert_eq!(lenient.valid[0].category.as_deref(), Some("Subscriptions"));
}
