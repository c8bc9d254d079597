#![cfg(not(tarpaulin_include))]

use metawiz::config::WizardSettings;
use metawiz::downloader;
use metawiz::field::{Attribute, FieldIndex};
use metawiz::loader::read_field_items;
use metawiz::protocol::{PackageRequest, PackageResponse};
use metawiz::saving;
use metawiz::wizard::{AddFieldsOutcome, PackageChange, SubmitOutcome, Wizard};
use std::env;
use std::io::{self, BufRead, Write};
use std::time::Instant;

fn ask(message: &str) -> bool {
    print!("{} [y/N] ", message);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn parse_target(index: &str, attribute: &str) -> Result<(FieldIndex, Attribute), String> {
    let index: FieldIndex = index.parse().map_err(|_| "invalid field index".to_string())?;
    let attribute =
        Attribute::from_name(attribute).ok_or_else(|| "unknown attribute".to_string())?;
    Ok((index, attribute))
}

fn show(wizard: &Wizard) {
    let form = wizard.form();
    println!("study: {}", form.study_name);
    if let Some(package) = wizard.package() {
        println!("package: {} / {}", package.env, package.sample_type);
    }
    for panel in form.fields() {
        let definition = panel.collect();
        let values = serde_json::to_string(&definition).unwrap_or_default();
        println!("  [{}] {} {}", panel.index, panel.field_name(), values);
    }
    if let Some(report) = wizard.last_report() {
        if !report.is_valid() {
            println!("{}", report.summary_text());
        }
    }
}

fn help() {
    println!("Commands:");
    println!("  q: Quit");
    println!("  add <name>[,<name>...]: Add custom fields");
    println!("  set <index> <attribute> <value>: Set a control value");
    println!("  check <index> <attribute> <value> <on|off>: Tick or untick a checkbox");
    println!("  remove <index>: Remove a field");
    println!("  select <index>: Select a field in the existing fields list");
    println!("  study <name>: Set the study name");
    println!("  package <env> <sample_type>: Choose a package");
    println!("  load <file.json>: Load field names or definitions");
    println!("  upload <file>: Upload a saved wizard file");
    println!("  submit: Validate the form");
    println!("  save <file>: Save the form as a wizard file");
    println!("  csv: Print the metadata template as CSV");
    println!("  show: Print the form");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    let settings = match args.get(1) {
        Some(path) => WizardSettings::load(path)?,
        None => WizardSettings::from_env()?,
    };
    let mut wizard = Wizard::new(settings)?;

    let mut start_time = Instant::now();
    let mut status = String::from("ok");
    loop {
        let elapsed_time = start_time.elapsed().as_secs_f64();
        print!("[{:.1}] ({}) > ", elapsed_time, status);
        io::stdout().flush()?;

        let mut command = String::new();
        if io::stdin().lock().read_line(&mut command)? == 0 {
            break;
        }
        let command = command.trim();
        start_time = Instant::now();

        let (verb, rest) = command.split_once(' ').unwrap_or((command, ""));
        let rest = rest.trim();
        status = match verb {
            "" => String::from("invalid command"),
            "q" => break,
            "help" => {
                help();
                String::from("ok")
            }
            "show" => {
                show(&wizard);
                String::from("ok")
            }
            "add" => {
                let text = rest.replace(',', "\n");
                match wizard.add_field_names(&text) {
                    Ok(AddFieldsOutcome::Added(indexes)) => format!("added {}", indexes.len()),
                    Ok(AddFieldsOutcome::Rejected(messages)) => {
                        for message in messages {
                            println!("{}", message);
                        }
                        String::from("invalid field names")
                    }
                    Err(e) => e.to_string(),
                }
            }
            "set" => {
                let parts: Vec<&str> = rest.splitn(3, ' ').collect();
                if parts.len() < 2 {
                    String::from("invalid command")
                } else {
                    let value = parts.get(2).copied().unwrap_or("");
                    match parse_target(parts[0], parts[1]) {
                        Ok((index, attribute)) => match wizard.set_value(index, attribute, value) {
                            Ok(()) => String::from("ok"),
                            Err(e) => e.to_string(),
                        },
                        Err(e) => e,
                    }
                }
            }
            "check" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                if parts.len() != 4 {
                    String::from("invalid command")
                } else {
                    match parse_target(parts[0], parts[1]) {
                        Ok((index, attribute)) => {
                            let checked = parts[3] == "on";
                            match wizard.set_checked(index, attribute, parts[2], checked) {
                                Ok(()) => String::from("ok"),
                                Err(e) => e.to_string(),
                            }
                        }
                        Err(e) => e,
                    }
                }
            }
            "remove" => match rest.parse::<FieldIndex>() {
                Ok(index) => match wizard.remove_field(index, ask) {
                    Ok(true) => String::from("ok"),
                    Ok(false) => String::from("kept"),
                    Err(e) => e.to_string(),
                },
                Err(_) => String::from("invalid field index"),
            },
            "select" => match rest.parse::<FieldIndex>() {
                Ok(index) => match wizard.select_field(index) {
                    Ok(()) => String::from("ok"),
                    Err(e) => e.to_string(),
                },
                Err(_) => String::from("invalid field index"),
            },
            "study" => {
                wizard.set_study_name(rest);
                String::from("ok")
            }
            "package" => match rest.split_once(' ') {
                Some((env, sample_type)) => {
                    let found = wizard.settings().find_package(env, sample_type.trim()).cloned();
                    match found {
                        Some(package) => {
                            let response = PackageResponse::for_package(
                                &package,
                                &wizard.settings().reserved_words,
                            );
                            let request = PackageRequest {
                                env: package.env.clone(),
                                sample_type: package.sample_type.clone(),
                            };
                            match wizard.change_package(request, ask) {
                                PackageChange::Reset => {
                                    wizard.apply_package_response(&response);
                                    format!("{} package fields", response.field_names.len())
                                }
                                PackageChange::Unchanged => String::from("unchanged"),
                                PackageChange::Declined => String::from("kept"),
                            }
                        }
                        None => String::from("unknown package"),
                    }
                }
                None => String::from("invalid command"),
            },
            "load" => match read_field_items(rest).and_then(|items| wizard.load(&items)) {
                Ok(indexes) => format!("added {}", indexes.len()),
                Err(e) => e.to_string(),
            },
            "upload" => match std::fs::read(rest) {
                Ok(bytes) => {
                    let response = saving::upload_response(&[(rest.to_string(), bytes)]);
                    match wizard.apply_upload_response(&response) {
                        Ok(errors) if errors.is_empty() => String::from("ok"),
                        Ok(errors) => errors.join(" "),
                        Err(e) => e.to_string(),
                    }
                }
                Err(e) => e.to_string(),
            },
            "submit" => match wizard.submit() {
                SubmitOutcome::Accepted(_) => String::from("ok"),
                SubmitOutcome::Rejected(report) => {
                    println!("{}", report.summary_text());
                    format!("{} errors", report.errors.len())
                }
            },
            "save" => match wizard.submit() {
                SubmitOutcome::Accepted(submission) => {
                    match saving::save_wizard_file(&submission, rest) {
                        Ok(()) => String::from("ok"),
                        Err(e) => e.to_string(),
                    }
                }
                SubmitOutcome::Rejected(report) => format!("{} errors", report.errors.len()),
            },
            "csv" => match wizard.submit() {
                SubmitOutcome::Accepted(submission) => match downloader::to_csv(&submission) {
                    Ok(csv) => {
                        print!("{}", csv);
                        String::from("ok")
                    }
                    Err(e) => e.to_string(),
                },
                SubmitOutcome::Rejected(report) => format!("{} errors", report.errors.len()),
            },
            _ => String::from("invalid command"),
        };
    }

    Ok(())
}
