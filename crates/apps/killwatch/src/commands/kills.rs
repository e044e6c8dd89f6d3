use std::fs;

use lib_tracker::{CommittedKind, CommittedRecord};

use crate::{cli::args::KillsArgs, Result};

pub fn kills(args: KillsArgs) -> Result<()> {
	let records = CommittedRecord::read_all(&fs::read(&args.log)?)?;
	let kills = successful_kills(&records)?;

	match args.victim {
		Some(victim) => match killer_of(&kills, victim) {
			Some(rec) => println!("{}", format_kill(rec)),
			None => println!("no recorded kill of pid {victim}"),
		},
		None => {
			for rec in &kills {
				println!("{}", format_kill(rec));
			}
		}
	}

	Ok(())
}

fn successful_kills(records: &[CommittedRecord]) -> Result<Vec<&CommittedRecord>> {
	let mut kills = Vec::new();
	for rec in records {
		if rec.kind()? == CommittedKind::KillSucceeded {
			kills.push(rec);
		}
	}
	Ok(kills)
}

fn killer_of<'a>(kills: &[&'a CommittedRecord], victim: u32) -> Option<&'a CommittedRecord> {
	let victim = i32::try_from(victim).ok()?;
	kills.iter().rev().find(|rec| rec.target_pid() == victim).copied()
}

fn format_kill(rec: &CommittedRecord) -> String {
	format!(
		"#{seq} ts={ts} {comm}({pid}) uid={uid} -> {target}",
		seq = rec.seq,
		ts = rec.timestamp,
		comm = rec.comm(),
		pid = rec.actor_pid,
		uid = rec.actor_uid,
		target = rec.target_pid(),
	)
}

// region:    --- Tests


// endregion: --- Tests
