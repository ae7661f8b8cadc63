mod common;

use common::{date, memory_repo, new_employee, output_of, session_with, RecordingRepository};
use employee_core::{
    ConsoleError, EmployeeRepository, MenuAction, RepoError, Salary, SessionError, SettingsFile,
};

#[test]
fn add_flow_reprompts_until_every_field_is_valid() {
    let input = "\n\
                 Ada\n\
                 Lovelace\n\
                 ada.example.com\n\
                 ada@example.com\n\
                 1990-13-01\n\
                 2030-01-01\n\
                 1926-10-17\n\
                 1990-12-10\n\
                 -5\n\
                 12.345\n\
                 5000.50\n";
    let (mut session, _dir) = session_with(memory_repo(), input);

    let id = session.add_employee().unwrap();

    let stored = session.service_mut().get_employee(id).unwrap().unwrap();
    assert_eq!(stored.first_name, "Ada");
    assert_eq!(stored.last_name, "Lovelace");
    assert_eq!(stored.email, "ada@example.com");
    assert_eq!(stored.date_of_birth, date(1990, 12, 10));
    assert_eq!(stored.salary, Salary::from_cents(500_050).unwrap());

    let output = output_of(&session);
    assert!(output.contains("First name is required."));
    assert!(output.contains("Enter a valid email address."));
    assert!(output.contains("Enter the date as yyyy-mm-dd."));
    assert!(output.contains("Date of birth cannot be in the future."));
    assert!(output.contains("Date of birth must be after 1926-10-17."));
    assert!(output.contains("Salary cannot be negative."));
    assert!(output.contains("more than two decimal places"));
    assert!(output.contains(&format!("Employee added with ID {id}.")));
}

#[test]
fn duplicate_email_is_rejected_before_create_is_invoked() {
    let repo = RecordingRepository::with_employees(vec![new_employee(
        "Ada",
        "Lovelace",
        "ada@example.com",
        5000,
    )]);
    let (mut session, _dir) = session_with(repo, "Grace\nHopper\nada@example.com\n");

    let err = session.add_employee().unwrap_err();
    assert!(matches!(
        err,
        SessionError::Console(ConsoleError::InputClosed)
    ));

    let output = output_of(&session);
    assert!(output.contains("This email is already used by another employee."));

    let (service, _, _) = session.into_parts();
    let repo = service.into_repository();
    assert!(repo.called("email_exists"));
    assert!(!repo.called("create"));
    assert_eq!(repo.employees.len(), 1);
}

#[test]
fn update_salary_only_leaves_other_fields_untouched() {
    let mut repo = memory_repo();
    let id = repo
        .create(&new_employee("Ada", "Lovelace", "ada@example.com", 5000))
        .unwrap();
    let before = repo.get_by_id(id).unwrap().unwrap();
    let (mut session, _dir) = session_with(repo, &format!("{id}\n5\n7200.25\n"));

    session.update_employee().unwrap();

    let after = session.service_mut().get_employee(id).unwrap().unwrap();
    assert_eq!(after.salary, Salary::from_cents(720_025).unwrap());
    assert_eq!(after.first_name, before.first_name);
    assert_eq!(after.last_name, before.last_name);
    assert_eq!(after.email, before.email);
    assert_eq!(after.date_of_birth, before.date_of_birth);
    assert!(output_of(&session).contains("Employee updated."));
}

#[test]
fn update_email_accepts_the_records_own_address() {
    let mut repo = memory_repo();
    let id = repo
        .create(&new_employee("Ada", "Lovelace", "ada@example.com", 5000))
        .unwrap();
    repo.create(&new_employee("Grace", "Hopper", "grace@example.com", 5000))
        .unwrap();
    let (mut session, _dir) = session_with(
        repo,
        &format!("{id}\n3\ngrace@example.com\nada@example.com\n"),
    );

    session.update_employee().unwrap();

    let after = session.service_mut().get_employee(id).unwrap().unwrap();
    assert_eq!(after.email, "ada@example.com");
    let output = output_of(&session);
    assert_eq!(
        output
            .matches("This email is already used by another employee.")
            .count(),
        1
    );
}

#[test]
fn update_all_fields_rewrites_the_record() {
    let mut repo = memory_repo();
    let id = repo
        .create(&new_employee("Ada", "Lovelace", "ada@example.com", 5000))
        .unwrap();
    let input = format!("{id}\n6\nAugusta\nKing\naugusta@example.com\n1985-12-10\n6100\n");
    let (mut session, _dir) = session_with(repo, &input);

    session.update_employee().unwrap();

    let after = session.service_mut().get_employee(id).unwrap().unwrap();
    assert_eq!(
        after,
        employee_core::NewEmployee {
            first_name: "Augusta".to_string(),
            last_name: "King".to_string(),
            email: "augusta@example.com".to_string(),
            date_of_birth: date(1985, 12, 10),
            salary: Salary::from_units(6100),
        }
        .with_id(id)
    );
}

#[test]
fn update_with_invalid_field_choice_changes_nothing() {
    let repo = RecordingRepository::with_employees(vec![new_employee(
        "Ada",
        "Lovelace",
        "ada@example.com",
        5000,
    )]);
    let (mut session, _dir) = session_with(repo, "1\n9\n");

    session.update_employee().unwrap();

    assert!(output_of(&session).contains("Invalid field choice."));
    let (service, _, _) = session.into_parts();
    assert!(!service.into_repository().called("update"));
}

#[test]
fn update_of_unknown_id_reports_not_found() {
    let repo = RecordingRepository::with_employees(vec![new_employee(
        "Ada",
        "Lovelace",
        "ada@example.com",
        5000,
    )]);
    let (mut session, _dir) = session_with(repo, "99\n");

    let err = session.update_employee().unwrap_err();
    assert!(matches!(err, SessionError::Repo(RepoError::NotFound(99))));
}

#[test]
fn non_numeric_id_aborts_the_flow() {
    let repo = RecordingRepository::with_employees(vec![new_employee(
        "Ada",
        "Lovelace",
        "ada@example.com",
        5000,
    )]);
    let (mut session, _dir) = session_with(repo, "abc\n");

    session.delete_employee().unwrap();

    assert!(output_of(&session).contains("Employee ID must be a whole number."));
}

#[test]
fn declined_delete_keeps_the_record() {
    let mut repo = memory_repo();
    let id = repo
        .create(&new_employee("Ada", "Lovelace", "ada@example.com", 5000))
        .unwrap();
    let (mut session, _dir) = session_with(repo, &format!("{id}\nmaybe\n"));

    session.delete_employee().unwrap();

    assert!(session.service_mut().get_employee(id).unwrap().is_some());
    let output = output_of(&session);
    assert!(output.contains("Confirm deletion of: ID: "));
    assert!(output.contains("Deletion cancelled."));
}

#[test]
fn confirmed_delete_removes_the_record() {
    let mut repo = memory_repo();
    let id = repo
        .create(&new_employee("Ada", "Lovelace", "ada@example.com", 5000))
        .unwrap();
    let (mut session, _dir) = session_with(repo, &format!("{id}\nYes\n"));

    session.delete_employee().unwrap();

    assert!(session.service_mut().get_employee(id).unwrap().is_none());
    assert!(output_of(&session).contains("Employee deleted."));
}

#[test]
fn delete_on_empty_table_stops_after_listing() {
    let (mut session, _dir) = session_with(RecordingRepository::default(), "");

    session.delete_employee().unwrap();

    assert!(output_of(&session).contains("No employees found."));
}

#[test]
fn salary_report_lists_only_strictly_above_average() {
    let repo = RecordingRepository::with_employees(vec![
        new_employee("Alan", "Able", "a@example.com", 1000),
        new_employee("Bea", "Baker", "b@example.com", 3000),
        new_employee("Cid", "Carter", "c@example.com", 2000),
    ]);
    let (mut session, _dir) = session_with(repo, "");

    session.salary_report().unwrap();

    let output = output_of(&session);
    assert!(output.contains("Average salary: 2000.00"));
    assert!(output.contains("Employees earning above the average (1):"));
    assert!(output.contains("- Bea Baker: 3000.00"));
    assert!(!output.contains("Cid Carter"));
    assert!(!output.contains("Warning:"));
}

#[test]
fn salary_report_on_sqlite_agrees_with_client_side_count() {
    let mut repo = memory_repo();
    for (n, units) in [1000, 3000, 2000, 2500].into_iter().enumerate() {
        repo.create(&new_employee("F", "L", &format!("e{n}@example.com"), units))
            .unwrap();
    }
    let (mut session, _dir) = session_with(repo, "");

    let report = session.service_mut().above_average_report().unwrap();

    assert_eq!(report.store_count, 2);
    assert!(report.counts_agree());
}

#[test]
fn salary_report_on_empty_table() {
    let (mut session, _dir) = session_with(RecordingRepository::default(), "");

    session.salary_report().unwrap();

    assert!(output_of(&session).contains("No employees found."));
}

#[test]
fn menu_reprompts_on_invalid_choices_and_exits_on_seven() {
    let repo = RecordingRepository::with_employees(vec![new_employee(
        "Ada",
        "Lovelace",
        "ada@example.com",
        5000,
    )]);
    let (mut session, _dir) = session_with(repo, "0\n8\nlist\n2\n\n7\n");

    session.run().unwrap();

    let output = output_of(&session);
    assert_eq!(
        output
            .matches("The option must be a number from 1 to 7: ")
            .count(),
        3
    );
    assert!(output.contains("ID: 1, Name: Ada Lovelace, Email: ada@example.com"));
    assert!(output.contains("Total employees: 1"));
    assert!(output.contains("Press Enter to continue..."));
}

#[test]
fn storage_failure_is_reported_and_menu_continues() {
    let mut repo = RecordingRepository::default();
    repo.fail_reads = true;
    let (mut session, _dir) = session_with(repo, "2\n\n2\n\n7\n");

    session.run().unwrap();

    let output = output_of(&session);
    assert_eq!(
        output
            .matches("Error: storage failure during `get_all`")
            .count(),
        2
    );
    assert!(output.contains("option 6"));
}

#[test]
fn closed_input_ends_the_session_cleanly() {
    let (mut session, _dir) = session_with(RecordingRepository::default(), "1\nAda\n");

    session.run().unwrap();
}

#[test]
fn set_connection_string_persists_the_new_value() {
    let (mut session, _dir) = session_with(RecordingRepository::default(), "\n/srv/staff.db\n");

    session.perform(MenuAction::SetConnectionString).unwrap();
    session.perform(MenuAction::SetConnectionString).unwrap();

    let output = output_of(&session);
    assert!(output.contains("The connection string cannot be empty."));
    assert!(output.contains("Restart the application to use it."));
    assert_eq!(session.settings().connection_string(), "/srv/staff.db");

    let (reloaded, _) = SettingsFile::load_or_create(session.settings().path()).unwrap();
    assert_eq!(reloaded.connection_string(), "/srv/staff.db");
}
