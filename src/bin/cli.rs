use campusflow::month_view::{describe_entry, render_month};
use campusflow::{
    SchedulerConfig, Session, expand, export_calendar_to_csv, import_calendar_from_csv,
    open_store, save_calendars_to_json,
};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::io::{self, Write};

const DEFAULT_DATA_FILE: &str = "events_data.json";

fn print_help() {
    println!(
        "Commands:\n  help                                   Show this help\n  calendars                              List calendars\n  calendar add <name...>                 Create a calendar and select it\n  calendar select <name...>              Select a calendar\n  calendar delete                        Delete the selected calendar\n  show                                   Show the displayed month\n  next | prev                            Move to the next/previous month\n  goto <YYYY-MM>                         Display a given month\n  event <YYYY-MM-DD> <HH:MM> <text...>   Add an event\n  goal <YYYY-MM-DD> <HH:MM> <hours> <text...>\n                                         Add a goal (deadline, hours per week)\n  delete <position>                      Delete an entry by position\n  expand <path>                          Write goal expansion to <path>\n  export <path>                          Export the selected calendar as CSV\n  import <path>                          Append CSV entries to the selected calendar\n  save                                   Save calendars again\n  quit|exit                              Exit"
    );
}

/// JSON file path, or `sqlite:<path>` for the SQLite store.
fn data_location() -> String {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CAMPUSFLOW_DATA").ok())
        .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string())
}

fn parse_date_time(date_s: &str, time_s: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date_s, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time_s, "%H:%M").ok()?;
    Some(date.and_time(time))
}

fn parse_month(value: &str) -> Option<(i32, u32)> {
    let (year, month) = value.split_once('-')?;
    Some((year.parse().ok()?, month.parse().ok()?))
}

fn print_month(session: &Session) {
    let (year, month) = session.displayed_month();
    match session.selected_calendar() {
        Ok(calendar) => {
            if let Some(name) = session.selected_name() {
                println!("Viewing Calendar: {name}");
            }
            if let Some(text) = render_month(year, month, calendar) {
                print!("{text}");
            }
        }
        Err(e) => println!("{e}"),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let location = data_location();
    let opened = open_store(&location)
        .map_err(|e| e.to_string())
        .and_then(|store| {
            Session::open(store, Local::now().date_naive()).map_err(|e| e.to_string())
        });
    let mut session = match opened {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Could not load '{location}': {e}");
            std::process::exit(1);
        }
    };

    println!("CampusFlow - type 'help' for commands\n");
    if session.selected_name().is_some() {
        print_month(&session);
    } else {
        println!("Please add or select a calendar to view.");
    }

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "calendars" => {
                if session.calendars().is_empty() {
                    println!("No calendars.");
                }
                for name in session.calendars().names() {
                    let marker = if Some(name) == session.selected_name() { "*" } else { " " };
                    println!("{marker} {name}");
                }
            }
            "calendar" => {
                let sub = parts.next();
                let name = parts.collect::<Vec<_>>().join(" ");
                match sub {
                    Some("add") => match session.create_calendar(&name) {
                        Ok(()) => println!("Calendar '{}' added.", name.trim()),
                        Err(e) => println!("Error: {e}"),
                    },
                    Some("select") => match session.select_calendar(&name) {
                        Ok(()) => print_month(&session),
                        Err(e) => println!("Error: {e}"),
                    },
                    Some("delete") => match session.delete_calendar() {
                        Ok(deleted) => println!("Calendar '{deleted}' deleted."),
                        Err(e) => println!("Error: {e}"),
                    },
                    _ => println!("Usage: calendar <add|select> <name> | calendar delete"),
                }
            }
            "show" => print_month(&session),
            "next" => {
                session.next_month();
                print_month(&session);
            }
            "prev" => {
                session.previous_month();
                print_month(&session);
            }
            "goto" => {
                let moved = parts
                    .next()
                    .and_then(parse_month)
                    .is_some_and(|(year, month)| session.set_displayed_month(year, month));
                if moved {
                    print_month(&session);
                } else {
                    println!("Usage: goto <YYYY-MM>");
                }
            }
            "event" => {
                let date_s = parts.next();
                let time_s = parts.next();
                let text = parts.collect::<Vec<_>>().join(" ");
                match (date_s, time_s) {
                    (Some(date_s), Some(time_s)) => {
                        let Some(when) = parse_date_time(date_s, time_s) else {
                            println!("Invalid date/time (YYYY-MM-DD HH:MM)");
                            continue;
                        };
                        match session.add_event(when, &text) {
                            Ok(()) => println!("Event added!"),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: event <YYYY-MM-DD> <HH:MM> <text...>"),
                }
            }
            "goal" => {
                let date_s = parts.next();
                let time_s = parts.next();
                let hours_s = parts.next();
                let text = parts.collect::<Vec<_>>().join(" ");
                match (date_s, time_s, hours_s) {
                    (Some(date_s), Some(time_s), Some(hours_s)) => {
                        let Some(deadline) = parse_date_time(date_s, time_s) else {
                            println!("Invalid date/time (YYYY-MM-DD HH:MM)");
                            continue;
                        };
                        let hours: i64 = match hours_s.parse() {
                            Ok(v) => v,
                            Err(_) => {
                                println!("Invalid hours per week");
                                continue;
                            }
                        };
                        match session.add_goal(deadline, &text, hours) {
                            Ok(()) => println!("Goal added!"),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: goal <YYYY-MM-DD> <HH:MM> <hours> <text...>"),
                }
            }
            "delete" => {
                let position: usize = match parts.next().map(str::parse) {
                    Some(Ok(v)) => v,
                    _ => {
                        println!("Usage: delete <position>");
                        continue;
                    }
                };
                match session.delete_entry(position) {
                    Ok(entry) => println!("Deleted {}", describe_entry(position, &entry)),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "expand" => {
                let Some(out) = parts.next() else {
                    println!("Usage: expand <path>");
                    continue;
                };
                let report = expand(
                    session.calendars(),
                    &SchedulerConfig::default(),
                    Local::now().naive_local(),
                );
                match save_calendars_to_json(&report.collection, out) {
                    Ok(()) => println!(
                        "Processing complete. Output saved to '{out}'. ({})",
                        report.to_cli_summary()
                    ),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "export" => {
                let Some(out) = parts.next() else {
                    println!("Usage: export <path>");
                    continue;
                };
                match session.selected_calendar() {
                    Ok(calendar) => match export_calendar_to_csv(calendar, out) {
                        Ok(()) => println!("Exported {} entries to '{out}'.", calendar.len()),
                        Err(e) => println!("Error: {e}"),
                    },
                    Err(e) => println!("Error: {e}"),
                }
            }
            "import" => {
                let Some(src) = parts.next() else {
                    println!("Usage: import <path>");
                    continue;
                };
                let imported = match import_calendar_from_csv(src) {
                    Ok(calendar) => calendar,
                    Err(e) => {
                        println!("Error: {e}");
                        continue;
                    }
                };
                match session.import_entries(imported.entries().to_vec()) {
                    Ok(count) => println!("Imported {count} entries from '{src}'."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "save" => match session.save() {
                Ok(()) => println!("Saved."),
                Err(e) => println!("Error: {e}"),
            },
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
