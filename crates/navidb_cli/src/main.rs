//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `navidb_core` linkage with deterministic output.
//! - Optionally list the sections of one module: `navidb_cli <db-path> <module-id>`.

use navidb_core::db::open_db;
use navidb_core::{ModuleId, SqliteSectionStore};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("navidb_core ping={}", navidb_core::ping());
    println!("navidb_core version={}", navidb_core::core_version());

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => ExitCode::SUCCESS,
        [db_path, module_id] => match list_sections(db_path, module_id) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("usage: navidb_cli [<db-path> <module-id>]");
            ExitCode::from(2)
        }
    }
}

fn list_sections(db_path: &str, module_id: &str) -> Result<(), Box<dyn Error>> {
    let module_id: ModuleId = module_id
        .parse()
        .map_err(|err| format!("invalid module id `{module_id}`: {err}"))?;

    let conn = open_db(db_path)?;
    let store = SqliteSectionStore::try_from_connection(&conn)?;

    let mut sections: Vec<_> = store.load_sections(module_id)?.into_iter().collect();
    sections.sort_by_key(|(section, _)| (section.start_address, section.id));

    for (section, comment_id) in sections {
        let comment = comment_id.map_or_else(|| "-".to_string(), |id| id.to_string());
        println!(
            "{:>6} {:<16} {}-{} {:<18} bytes={} comment={}",
            section.id,
            section.name,
            section.start_address,
            section.end_address,
            section.permission,
            section.data.len(),
            comment
        );
    }
    Ok(())
}
