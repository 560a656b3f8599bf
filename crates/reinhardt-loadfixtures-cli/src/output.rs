//! Terminal output of the loadfixtures command.

use colored::Colorize;
use reinhardt_loadfixtures::engine::RunReport;
use reinhardt_loadfixtures::graph::LevelGraph;

/// Prints the level graph, one header per level.
pub fn print_graph(graph: &LevelGraph) {
	for (level, descriptors) in graph.levels() {
		println!("{}", format!("Level : {}", level).bold());
		for descriptor in descriptors {
			println!("  {} ({})", descriptor.model_label.cyan(), descriptor.fixture_label);
		}
	}
}

/// Summarizes a run.
pub fn summary(report: &RunReport) -> String {
	match report {
		RunReport::NothingToLoad => "No fixtures to load.".to_string(),
		RunReport::Loaded {
			fixtures_loaded,
			objects_loaded,
		} => format!(
			"Installed {} object(s) from {} fixture(s)",
			objects_loaded, fixtures_loaded
		),
		RunReport::DryRun(entries) => format!("Dry run: {} model(s) with fixtures", entries.len()),
	}
}

/// Prints the outcome of a run.
pub fn print_report(report: &RunReport, verbosity: u8) {
	if let RunReport::DryRun(entries) = report {
		for entry in entries {
			println!("{}", entry);
		}
	}
	match report {
		RunReport::NothingToLoad => println!("{}", summary(report)),
		_ if verbosity > 0 => println!("{}", summary(report).green()),
		_ => {}
	}
}
