//! CLI module for the `aegis` binary.
//!
//! Provides command-line commands for inspecting and driving the agent's
//! self-model: the awakening context, the deferred queue, the gate and the
//! experience log.

use anyhow::{bail, Context as _};
use serde_json::json;

use crate::contemplation::{Verdict, URGENT_KEY};
use crate::experience::ActionOutcome;
use crate::utilities::ContextMap;
use crate::Aegis;

/// Default number of experiences shown by `recent`.
pub const DEFAULT_RECENT_COUNT: usize = 5;

/// Available CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliCommand {
    /// Print the awakening context.
    Context,
    /// Summarize the contemplation queue.
    Queue,
    /// Gate a candidate action.
    Contemplate,
    /// Revisit the deferred queue.
    Revisit,
    /// Feed an action outcome through the experience pipeline.
    Process,
    /// Show the latest experiences.
    Recent,
    /// Show version information.
    Version,
}

impl std::fmt::Display for CliCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Context => write!(f, "context"),
            Self::Queue => write!(f, "queue"),
            Self::Contemplate => write!(f, "contemplate"),
            Self::Revisit => write!(f, "revisit"),
            Self::Process => write!(f, "process"),
            Self::Recent => write!(f, "recent"),
            Self::Version => write!(f, "version"),
        }
    }
}

/// Parse a CLI command from a string.
pub fn parse_command(cmd: &str) -> Option<CliCommand> {
    match cmd {
        "context" | "awaken" => Some(CliCommand::Context),
        "queue" => Some(CliCommand::Queue),
        "contemplate" => Some(CliCommand::Contemplate),
        "revisit" => Some(CliCommand::Revisit),
        "process" => Some(CliCommand::Process),
        "recent" => Some(CliCommand::Recent),
        "version" | "--version" | "-v" => Some(CliCommand::Version),
        _ => None,
    }
}

pub fn usage() -> String {
    [
        "Usage: aegis <command> [args]",
        "",
        "Commands:",
        "  context                              Print the awakening context",
        "  queue                                Summarize the contemplation queue",
        "  contemplate <domain> <text> [--urgent]",
        "                                       Gate a candidate action",
        "  revisit [--urgent]                   Revisit deferred thoughts",
        "  process <domain> <action> <outcome>  Learn from an executed action",
        "  recent [count]                       Show the latest experiences",
        "  version                              Show version information",
    ]
    .join("\n")
}

/// Execute `command` against `aegis`, returning the text to print.
pub fn run(aegis: &Aegis, command: CliCommand, args: &[String]) -> anyhow::Result<String> {
    match command {
        CliCommand::Context => Ok(aegis.awakening_context()),
        CliCommand::Queue => Ok(aegis.queue_summary()),
        CliCommand::Contemplate => contemplate(aegis, args),
        CliCommand::Revisit => revisit(aegis, args),
        CliCommand::Process => process(aegis, args),
        CliCommand::Recent => recent(aegis, args),
        CliCommand::Version => Ok(format!("aegis {}", crate::VERSION)),
    }
}

/// Split off `--urgent` and turn it into the gate's context.
fn split_urgent(args: &[String]) -> (Vec<&str>, ContextMap) {
    let mut context = ContextMap::new();
    let mut rest = Vec::new();
    for arg in args {
        if arg == "--urgent" {
            context.insert(URGENT_KEY.to_string(), json!(true));
        } else {
            rest.push(arg.as_str());
        }
    }
    (rest, context)
}

fn contemplate(aegis: &Aegis, args: &[String]) -> anyhow::Result<String> {
    let (rest, context) = split_urgent(args);
    let Some((domain, words)) = rest.split_first() else {
        bail!("contemplate needs a domain and the thought text");
    };
    if words.is_empty() {
        bail!("contemplate needs the thought text");
    }
    let text = words.join(" ");

    let verdict = aegis
        .contemplate(&text, domain, &context)
        .context("failed to contemplate thought")?;
    Ok(match verdict {
        Verdict::Ready => "READY: act now".to_string(),
        Verdict::Deferred { thought_id } => format!("DEFERRED: {}", thought_id),
    })
}

fn revisit(aegis: &Aegis, args: &[String]) -> anyhow::Result<String> {
    let (_, context) = split_urgent(args);
    let promoted = aegis
        .revisit_queue(&context)
        .context("failed to revisit contemplation queue")?;
    if promoted.is_empty() {
        return Ok(format!("No thoughts ripened.\n{}", aegis.queue_summary()));
    }
    let mut lines = vec![format!("{} thought(s) ready:", promoted.len())];
    lines.extend(promoted.iter().map(|t| format!("  - [{}] {}", t.domain, t.thought)));
    Ok(lines.join("\n"))
}

fn process(aegis: &Aegis, args: &[String]) -> anyhow::Result<String> {
    let [domain, action, outcome] = args else {
        bail!("process needs <domain> <action> <outcome>");
    };
    let exp = aegis
        .process(ActionOutcome::new(action.as_str(), outcome.as_str()).with_domain(domain.as_str()))
        .context("failed to process experience")?;
    Ok(format!(
        "{} ({}, valence {:.2})\n{}",
        exp.outcome_type, exp.attribution, exp.emotional_valence, exp.narrative
    ))
}

fn recent(aegis: &Aegis, args: &[String]) -> anyhow::Result<String> {
    let count = match args.first() {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("invalid count '{}'", raw))?,
        None => DEFAULT_RECENT_COUNT,
    };
    let experiences = aegis.recent_experiences(count);
    if experiences.is_empty() {
        return Ok("No experiences recorded.".to_string());
    }
    Ok(experiences
        .iter()
        .map(|e| {
            format!(
                "{} [{}] {}: {}",
                e.timestamp.to_rfc3339(),
                e.domain,
                e.outcome_type,
                e.narrative
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}
