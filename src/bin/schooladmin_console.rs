//!
//! schooladmin console binary
//! --------------------------
//! Interactive front end over `Console`: sign in, move between screens through
//! the guard chain, browse and search collections, collect fees, mark
//! attendance and read notifications. Talks to the REST API given by `--api`
//! (or `SCHOOLADMIN_API_URL`) and keeps its durable state under `--state-dir`.

use std::env;

use anyhow::{Context, Result};
use chrono::Utc;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde::Serialize;

use schooladmin::collections::{
    attendance_stats, fee_summary, filter_attendance, filter_fees, filter_profiles, filter_students, filter_teachers,
    AttendanceRecord, AttendanceStatus, FeeRecord, FeeStatus, LatestSearch, SchoolClass, Student, Teacher, UserProfile,
};
use schooladmin::config::{has_flag, AppConfig};
use schooladmin::console::Console;
use schooladmin::error::{AppError, AppResult};
use schooladmin::identity::validation::SignupForm;
use schooladmin::notifications::relative_age;
use schooladmin::routing::NavigationOutcome;

fn print_usage() {
    eprintln!(
        "Usage:\n  schooladmin_console [--api <url>] [--state-dir <path>]\n\nFlags:\n  --api <url>          REST API base (env: SCHOOLADMIN_API_URL, default http://localhost:3000)\n  --state-dir <path>   Durable client state (env: SCHOOLADMIN_STATE_DIR, default .schooladmin)\n  -h, --help           Show this help\n\nInteractive commands:\n  login <email> <password>                 sign in and continue to the page you were sent from\n  logout                                   end the session\n  signup <name> <email> <password>         register a new account (accepts the terms)\n  go <path>                                navigate, e.g. go /fees\n  whoami                                   show the signed-in account and current location\n  list <collection> [text]                 students | teachers | classes | attendance | fees | profiles\n  search <collection> <text>               like list, debounced and latest-wins\n  fees [paid|pending|partial]              fee records with the collection summary\n  collect <fee id> <amount>                collect a payment against a fee record\n  attendance <date> [class]                attendance for a day with totals\n  mark <student id> <date> <present|absent|late>\n  profile <name> <email>                   update your name and email\n  password <current> <new>                 change your password\n  notifications                            list notifications\n  read <id> | read-all | dismiss <id>      notification housekeeping\n  theme                                    toggle dark mode\n  help                                     show this help\n  quit | exit                              leave the console"
    );
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("error: {}", e),
    }
}

fn report<T>(result: AppResult<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            eprintln!("error: {}", e.user_message());
            None
        }
    }
}

fn print_outcome(outcome: &NavigationOutcome) {
    match outcome {
        NavigationOutcome::Arrived(loc) => println!("-> {}", loc),
        NavigationOutcome::Redirected { attempted, to, .. } => println!("{} -> {}", attempted, to),
    }
}

fn parse_id(raw: &str) -> AppResult<u64> {
    raw.parse::<u64>()
        .map_err(|_| AppError::UserInput { code: "invalid_id".into(), message: format!("'{}' is not a record id", raw) })
}

fn parse_attendance(raw: &str) -> AppResult<AttendanceStatus> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_ascii_lowercase())).map_err(|_| AppError::UserInput {
        code: "invalid_status".into(),
        message: format!("'{}' is not one of present, absent, late", raw),
    })
}

async fn list_collection(console: &Console, collection: &str, query: &str) -> AppResult<()> {
    match collection {
        "students" => print_json(&filter_students(&console.list::<Student>().await?, query)),
        "teachers" => print_json(&filter_teachers(&console.list::<Teacher>().await?, query)),
        "classes" => {
            let classes = console.list::<SchoolClass>().await?;
            let hits: Vec<&SchoolClass> = classes
                .iter()
                .filter(|c| schooladmin::collections::matches_query(query, &[c.name.as_str(), c.class_teacher.as_str()]))
                .collect();
            print_json(&hits)
        }
        "attendance" => {
            let records = console.list::<AttendanceRecord>().await?;
            let hits: Vec<&AttendanceRecord> = records
                .iter()
                .filter(|r| schooladmin::collections::matches_query(query, &[r.student_name.as_str()]))
                .collect();
            print_json(&hits)
        }
        "fees" => print_json(&filter_fees(&console.list::<FeeRecord>().await?, None, query)),
        "profiles" => print_json(&filter_profiles(&console.list::<UserProfile>().await?, query)),
        other => {
            return Err(AppError::UserInput { code: "unknown_collection".into(), message: format!("no collection '{}'", other) })
        }
    }
    Ok(())
}

async fn show_fees(console: &Console, status: Option<&str>) -> AppResult<()> {
    let status = match status {
        Some(s) => Some(FeeStatus::parse(s).ok_or_else(|| AppError::UserInput {
            code: "invalid_status".into(),
            message: format!("'{}' is not one of paid, pending, partial", s),
        })?),
        None => None,
    };
    let records = console.list::<FeeRecord>().await?;
    print_json(&filter_fees(&records, status, ""));
    print_json(&fee_summary(&records));
    Ok(())
}

async fn show_attendance(console: &Console, date: &str, class_name: Option<&str>) -> AppResult<()> {
    let records = console.list::<AttendanceRecord>().await?;
    let day = filter_attendance(&records, date, class_name, "");
    print_json(&day);
    print_json(&attendance_stats(day.iter().copied()));
    Ok(())
}

async fn mark(console: &Console, student_id: &str, date: &str, status: &str) -> AppResult<()> {
    let status = parse_attendance(status)?;
    let student = console.collection::<Student>().get_by_id(parse_id(student_id)?).await?;
    let saved = console.mark_attendance(&student, date, status).await?;
    print_json(&saved);
    Ok(())
}

fn show_notifications(console: &Console) {
    let now = Utc::now();
    let store = console.notifications();
    println!("{} unread", store.unread_count());
    for n in store.list() {
        let mark = if n.read { ' ' } else { '*' };
        println!("{} [{}] {:<8} {} - {} ({})", mark, n.id, n.severity.as_str(), n.title, n.message, relative_age(n.timestamp, now));
    }
}

fn whoami(console: &Console) {
    match console.current_identity() {
        Some(ident) => println!("{} <{}> role={} permissions={:?}", ident.display_name, ident.email, ident.role, ident.permissions),
        None => println!("not signed in"),
    }
    println!("at {}", console.location());
    if let Some(notice) = console.active_notice() {
        println!("! {}", notice.message());
    }
}

fn run_repl(rt: tokio::runtime::Runtime, console: Console) -> Result<()> {
    let mut rl = DefaultEditor::new().context("failed to start the line editor")?;
    let search = LatestSearch::new(console.config().search_debounce);
    println!("schooladmin console. Type 'help' for commands.");
    whoami(&console);
    loop {
        let line = match rl.readline("> ") {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("error: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);
        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();
        let rest = |from: usize| parts.get(from..).map(|p| p.join(" ")).unwrap_or_default();
        match (cmd.as_str(), parts.len()) {
            ("quit", _) | ("exit", _) => break,
            ("help", _) => print_usage(),
            ("login", 3) => {
                if let Some(out) = report(rt.block_on(console.login(parts[1], parts[2]))) {
                    print_outcome(&out);
                }
            }
            ("logout", _) => {
                console.logout();
                println!("signed out");
            }
            ("signup", n) if n >= 4 => {
                let form = SignupForm {
                    name: parts[1..n - 2].join(" "),
                    email: parts[n - 2].to_string(),
                    password: parts[n - 1].to_string(),
                    confirm: parts[n - 1].to_string(),
                    accept_terms: true,
                };
                if let Some(rec) = report(rt.block_on(console.signup(&form))) {
                    println!("registered {}; please login", rec.email);
                }
            }
            ("go", 2) => {
                let out = console.navigate(parts[1]);
                print_outcome(&out);
                if let Some(notice) = console.active_notice() {
                    println!("! {}", notice.message());
                }
            }
            ("whoami", _) => whoami(&console),
            ("list", n) if n >= 2 => {
                report(rt.block_on(list_collection(&console, parts[1], &rest(2))));
            }
            ("search", n) if n >= 3 => {
                let query = rest(2);
                let (c, collection) = (&console, parts[1]);
                match rt.block_on(search.run(collection, &query, |q| async move { list_collection(c, collection, &q).await })) {
                    Some(result) => {
                        report(result);
                    }
                    None => println!("(no change)"),
                }
            }
            ("fees", n) if n <= 2 => {
                report(rt.block_on(show_fees(&console, parts.get(1).copied())));
            }
            ("collect", 3) => {
                let today = Utc::now().format("%Y-%m-%d").to_string();
                let result = parse_id(parts[1]).and_then(|id| {
                    let amount = parse_id(parts[2])?;
                    rt.block_on(console.collect_fee(id, amount, &today))
                });
                if let Some(fee) = report(result) {
                    search.reset();
                    print_json(&fee);
                }
            }
            ("attendance", n) if n == 2 || n == 3 => {
                report(rt.block_on(show_attendance(&console, parts[1], parts.get(2).copied())));
            }
            ("mark", 4) => {
                if report(rt.block_on(mark(&console, parts[1], parts[2], parts[3]))).is_some() {
                    search.reset();
                }
            }
            ("profile", n) if n >= 3 => {
                let name = parts[1..n - 1].join(" ");
                if let Some(ident) = report(rt.block_on(console.update_profile(&name, parts[n - 1]))) {
                    search.reset();
                    println!("now {} <{}>", ident.display_name, ident.email);
                }
            }
            ("password", 3) => {
                if report(rt.block_on(console.change_password(parts[1], parts[2], parts[2]))).is_some() {
                    println!("password changed");
                }
            }
            ("notifications", _) => show_notifications(&console),
            ("read", 2) => match parse_id(parts[1]) {
                Ok(id) => console.notifications().mark_as_read(id),
                Err(e) => eprintln!("error: {}", e.user_message()),
            },
            ("read-all", _) => console.notifications().mark_all_as_read(),
            ("dismiss", 2) => match parse_id(parts[1]) {
                Ok(id) => console.notifications().delete(id),
                Err(e) => eprintln!("error: {}", e.user_message()),
            },
            ("theme", _) => {
                let dark = console.toggle_theme();
                println!("dark mode {}", if dark { "on" } else { "off" });
            }
            _ => eprintln!("unrecognised command '{}'; type 'help'", line),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    let args: Vec<String> = env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        print_usage();
        return Ok(());
    }

    let cfg = AppConfig::from_env_and_args(&args);
    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build().context("failed to start the async runtime")?;
    let console = rt.block_on(async { Console::open(cfg) }).context("failed to open the console state")?;
    run_repl(rt, console)
}
