//! Pointer scripts: a line-oriented recording of tool changes and pointer
//! events that can be replayed against an engine.
//!
//! ```text
//! # draw a box, then select and nudge it
//! tool rectangle
//! down 100 100
//! move 160 140
//! up 200 180
//! tool select
//! down 150 140
//! up 170 140
//! key Delete
//! ```
//!
//! Coordinates are screen pixels. Blank lines and `#` comments are skipped.

use kurbo::Point;
use studyboard_core::tools::ParseToolError;
use studyboard_core::{CanvasEngine, RenderSurface, ToolKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Tool(ToolKind),
    Down(Point),
    Move(Point),
    Up(Point),
    Key(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("line {line}: unknown command `{command}`")]
    UnknownCommand { line: usize, command: String },
    #[error("line {line}: {source}")]
    Tool { line: usize, source: ParseToolError },
    #[error("line {line}: expected `{command} <x> <y>`")]
    BadPoint { line: usize, command: String },
    #[error("line {line}: `{command}` takes exactly one argument")]
    BadArgument { line: usize, command: String },
}

fn parse_point(line: usize, command: &str, args: &[&str]) -> Result<Point, ScriptError> {
    let bad = || ScriptError::BadPoint {
        line,
        command: command.to_string(),
    };
    let [x, y] = args else {
        return Err(bad());
    };
    let x: f64 = x.parse().map_err(|_| bad())?;
    let y: f64 = y.parse().map_err(|_| bad())?;
    if !x.is_finite() || !y.is_finite() {
        return Err(bad());
    }
    Ok(Point::new(x, y))
}

fn single_arg<'a>(line: usize, command: &str, args: &[&'a str]) -> Result<&'a str, ScriptError> {
    match args {
        [arg] => Ok(arg),
        _ => Err(ScriptError::BadArgument {
            line,
            command: command.to_string(),
        }),
    }
}

pub fn parse_script(source: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    let mut steps = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.split('#').next().unwrap_or_default().trim();
        let mut words = text.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();
        let step = match command {
            "tool" => {
                let name = single_arg(line, command, &args)?;
                let tool = name
                    .parse::<ToolKind>()
                    .map_err(|source| ScriptError::Tool { line, source })?;
                ScriptStep::Tool(tool)
            }
            "down" => ScriptStep::Down(parse_point(line, command, &args)?),
            "move" => ScriptStep::Move(parse_point(line, command, &args)?),
            "up" => ScriptStep::Up(parse_point(line, command, &args)?),
            "key" => ScriptStep::Key(single_arg(line, command, &args)?.to_string()),
            other => {
                return Err(ScriptError::UnknownCommand {
                    line,
                    command: other.to_string(),
                });
            }
        };
        steps.push(step);
    }
    Ok(steps)
}

/// Outcome of a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub steps: usize,
    pub refused_tool_changes: usize,
    pub unhandled_keys: usize,
}

/// Feed the steps to the engine in order.
pub fn run_script<S: RenderSurface>(engine: &mut CanvasEngine<S>, steps: &[ScriptStep]) -> ReplayStats {
    let mut stats = ReplayStats::default();
    for step in steps {
        match step {
            ScriptStep::Tool(tool) => {
                if !engine.set_tool(*tool) {
                    log::warn!("Tool change to {tool} refused mid-gesture");
                    stats.refused_tool_changes += 1;
                }
            }
            ScriptStep::Down(p) => engine.pointer_down(*p),
            ScriptStep::Move(p) => engine.pointer_move(*p),
            ScriptStep::Up(p) => engine.pointer_up(*p),
            ScriptStep::Key(key) => {
                if !engine.key_down(key) {
                    log::debug!("Key {key} not handled");
                    stats.unhandled_keys += 1;
                }
            }
        }
        stats.steps += 1;
    }
    stats
}
