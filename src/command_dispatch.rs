//! Purpose: Hold top-level CLI command dispatch for `popcol`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Value-producing commands exit 1 when the service yields no value.
//! Invariants: Only a strict lookup miss turns into an error exit.

use super::*;

pub(super) fn dispatch_command(
    command: Command,
    service: &PopService,
    quiet: bool,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::aot::generate(shell, &mut cmd, "popcol", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::List => {
            emit_json(&service.get_pops())?;
            Ok(RunOutcome::ok())
        }
        Command::Get { id, strict } => {
            let pop = if strict {
                service.get_pop(id).map_err(|err| {
                    err.with_hint(format!(
                        "No pop with id {id} exists; run `popcol list` to see current ids."
                    ))
                })?
            } else {
                service.get_pop_no_404(id)
            };
            emit_json(&pop)?;
            Ok(RunOutcome::ok())
        }
        Command::Search { term } => {
            emit_json(&service.search_pops(&term))?;
            Ok(RunOutcome::ok())
        }
        Command::Add(fields) => {
            let pop = fields.into_pop();
            if pop.has_blank_name() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("name must not be blank")
                    .with_hint("Pass a non-empty --name."));
            }
            let created = service.add_pop(&pop);
            emit_json(&created)?;
            Ok(value_outcome(created.is_some()))
        }
        Command::Update { id, fields } => {
            let pop = fields.into_pop().with_id(id);
            let ack = service.update_pop(&pop);
            emit_json(&ack.as_ref().map(ack_json))?;
            Ok(value_outcome(ack.is_some()))
        }
        Command::Delete { id } => {
            let ack = service.delete_pop(id);
            emit_json(&ack.as_ref().map(ack_json))?;
            Ok(value_outcome(ack.is_some()))
        }
        Command::Shell => {
            let stdin = io::stdin();
            let mut stdout = io::stdout().lock();
            let emitted = shell::run_shell(service.clone(), stdin.lock(), &mut stdout, quiet)?;
            Ok(RunOutcome::ok().emitted(emitted))
        }
    }
}

fn value_outcome(produced: bool) -> RunOutcome {
    if produced {
        RunOutcome::ok()
    } else {
        RunOutcome::with_code(to_exit_code(ErrorKind::Internal))
    }
}

fn ack_json(ack: &popcol::api::Ack) -> Value {
    json!({ "status": ack.status, "body": ack.body })
}
