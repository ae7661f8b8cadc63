use chrono::NaiveDate;
use employee_core::{Employee, EmployeeValidationError, NewEmployee, Salary};

fn ada() -> Employee {
    NewEmployee {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
        salary: "5000.5".parse().unwrap(),
    }
    .with_id(7)
}

#[test]
fn employee_display_matches_console_listing() {
    assert_eq!(
        ada().to_string(),
        "ID: 7, Name: Ada Lovelace, Email: ada@example.com, Date of Birth: 1990-12-10, Salary: 5000.50"
    );
    assert_eq!(ada().full_name(), "Ada Lovelace");
}

#[test]
fn employee_serialization_uses_expected_wire_fields() {
    let employee = ada();

    let json = serde_json::to_value(&employee).unwrap();
    assert_eq!(json["id"], 7);
    assert_eq!(json["first_name"], "Ada");
    assert_eq!(json["last_name"], "Lovelace");
    assert_eq!(json["email"], "ada@example.com");
    assert_eq!(json["date_of_birth"], "1990-12-10");
    assert_eq!(json["salary"], 500_050);

    let decoded: Employee = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, employee);
}

#[test]
fn deserialization_rejects_negative_salary() {
    let mut json = serde_json::to_value(ada()).unwrap();
    json["salary"] = serde_json::json!(-1);

    let err = serde_json::from_value::<Employee>(json).unwrap_err();
    assert!(err.to_string().contains("negative"), "unexpected error: {err}");
}

#[test]
fn validation_reports_first_failing_field() {
    let mut employee = ada();
    employee.first_name = " ".to_string();
    employee.email = "nope".to_string();
    assert_eq!(
        employee.validate(),
        Err(EmployeeValidationError::EmptyFirstName)
    );

    employee.first_name = "Ada".to_string();
    assert_eq!(
        employee.validate(),
        Err(EmployeeValidationError::InvalidEmail("nope".to_string()))
    );
}

#[test]
fn salary_ordering_follows_cents() {
    let low: Salary = "999.99".parse().unwrap();
    let high = Salary::from_units(1000);

    assert!(low < high);
    assert_eq!(high.cents() - low.cents(), 1);
    assert_eq!(Salary::ZERO.to_string(), "0.00");
}
