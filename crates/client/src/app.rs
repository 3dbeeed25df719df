//! Line-oriented front end: one motion per line, events echoed as they arrive.
use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use runtime::{
    Event, LocalAuthority, ReconcileEvent, RuntimeHandle, SessionEvent, SubmitOutcome, Topic,
};

use crate::render::render;

const HELP: &str = "\
Type a motion and press enter: h j k l w b e ge W B E gE 0 ^ $ g_ gg G H M L { } ( ) % f<c> F<c> t<c> T<c> ; ,
Prefix a count for repeats (5j, 3w, 2G). Commands: :state :pending :authority :help :q";

pub async fn run(handle: RuntimeHandle, authority: LocalAuthority) -> Result<()> {
    let printer = tokio::spawn(print_events(handle.clone()));

    println!("{HELP}\n");
    println!("{}", render(&handle.query_state().await?));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => continue,
            ":q" | ":quit" => break,
            ":help" => println!("{HELP}"),
            ":state" => println!("{}", render(&handle.query_state().await?)),
            ":pending" => println!("pending: {:?}", handle.pending_moves().await?),
            ":authority" => println!("{}", render(&authority.state().await)),
            notation => submit(&handle, notation).await?,
        }
    }

    printer.abort();
    info!("input closed");
    Ok(())
}

async fn submit(handle: &RuntimeHandle, notation: &str) -> Result<()> {
    match handle.submit_str(notation).await {
        Ok(SubmitOutcome::Applied { id, outcome }) => {
            let partial = if outcome.is_partial() {
                format!(" ({}/{} steps)", outcome.moves_executed, outcome.requested)
            } else {
                String::new()
            };
            println!("{id} {notation}{partial}");
            println!("{}", render(&handle.query_state().await?));
        }
        Ok(SubmitOutcome::Blocked { .. }) => println!("{notation}: blocked"),
        Ok(SubmitOutcome::Dropped { throttle }) => println!("{notation}: dropped, {throttle}"),
        Err(runtime::RuntimeError::InvalidMotion(error)) => println!("{error}"),
        Err(error) => return Err(error.into()),
    }
    Ok(())
}

async fn print_events(handle: RuntimeHandle) {
    let mut reconcile = handle.subscribe(Topic::Reconcile);
    let mut session = handle.subscribe(Topic::Session);
    loop {
        let received = tokio::select! {
            event = reconcile.recv() => event,
            event = session.recv() => event,
        };
        match received {
            Ok(event) => {
                if let Some(line) = describe(&event) {
                    println!("{line}");
                }
            }
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "event printer lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn describe(event: &Event) -> Option<String> {
    match event {
        Event::Reconcile(ReconcileEvent::Confirmed {
            id,
            mismatch: true,
            position,
            ..
        }) => Some(format!("{id} corrected by authority to {position}")),
        Event::Reconcile(ReconcileEvent::RolledBack {
            id,
            reason,
            position,
            ..
        }) => Some(format!("{id} rolled back ({reason}), now at {position}")),
        Event::Reconcile(ReconcileEvent::ResyncRequired { id }) => {
            Some(format!("{id} lost, waiting for full state"))
        }
        Event::Session(SessionEvent::Completed { score }) => {
            Some(format!("level complete with score {score}"))
        }
        _ => None,
    }
}
