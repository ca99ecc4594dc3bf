//! Terminal output for the `init`, `config` and `run` commands
//!
//! With colors off every status line carries a plain `[TAG]` marker instead
//! of a glyph. `run` prints the notes themselves on stdout, so its progress
//! and summary lines go to stderr and `run <topic> > notes.md` captures only
//! the notes.

use crate::pipeline::{RunRecord, TaskOutput};
use crate::utils::toml_config::NotecrewConfig;
use owo_colors::OwoColorize;

const TABLE_INDENT: &str = "    ";
const COLUMN_GAP: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Info,
    Warn,
    Error,
}

impl Status {
    fn tag(self) -> &'static str {
        match self {
            Status::Ok => "[OK]",
            Status::Info => "[INFO]",
            Status::Warn => "[WARN]",
            Status::Error => "[ERROR]",
        }
    }

    fn paint(self, message: &str) -> String {
        match self {
            Status::Ok => format!("{} {}", "✓".green().bold(), message.green()),
            Status::Info => format!("{} {}", "•".blue(), message),
            Status::Warn => format!("{} {}", "⚠".yellow().bold(), message.yellow()),
            Status::Error => format!("{} {}", "✗".red().bold(), message.red()),
        }
    }
}

/// Output style configuration
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Honour the global `--no-color` flag
    pub fn from_flag(no_color: bool) -> Self {
        Self { colored: !no_color }
    }

    /// Print the notecrew banner
    pub fn banner(&self) {
        let art = [
            " _  _  ___ _____ ___ ___ ___ _____      __",
            "| \\| |/ _ \\_   _| __/ __| _ \\ __\\ \\    / /",
            "| .` | (_) || | | _| (__|   / _| \\ \\/\\/ / ",
            "|_|\\_|\\___/ |_| |___\\___|_|_\\___| \\_/\\_/  ",
        ];
        let tagline = "Research notes from a crew of agents";
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));

        println!();
        for line in art {
            if self.colored {
                println!("   {}", line.bright_cyan().bold());
            } else {
                println!("   {}", line);
            }
        }
        if self.colored {
            println!("\n   {} {}\n", tagline.bright_white().bold(), version.dimmed());
        } else {
            println!("\n   {} {}\n", tagline, version);
        }
    }

    fn status_line(&self, status: Status, message: &str) -> String {
        if self.colored {
            format!("  {}", status.paint(message))
        } else {
            format!("  {} {}", status.tag(), message)
        }
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.status_line(Status::Ok, message));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.status_line(Status::Info, message));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.status_line(Status::Warn, message));
    }

    /// Errors always go to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.status_line(Status::Error, message));
    }

    /// A file or directory written by `init`
    pub fn created(&self, kind: &str, path: &str) {
        if self.colored {
            println!("  {} {} {}", "✓".green().bold(), kind.dimmed(), path.bright_white());
        } else {
            println!("  [CREATED] {} {}", kind, path);
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "tip:".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// A shell command the user can copy
    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("     {}", format!("$ {}", cmd).bright_cyan());
        } else {
            println!("     $ {}", cmd);
        }
    }

    pub fn complete(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.bright_green().bold());
        } else {
            println!("\n  [DONE] {}", message);
        }
    }

    pub fn newline(&self) {
        println!();
    }

    /// The configured agents, one line each with their tools
    pub fn agent_list(&self, config: &NotecrewConfig) {
        for (name, agent) in &config.agents {
            let tools = if agent.tools.is_empty() {
                "no tools".to_string()
            } else {
                agent.tools.join(", ")
            };
            self.list_item(&format!("{} ({}): {}", name, agent.role, tools));
        }
    }

    /// Tasks in execution order with their agent, context and output file
    pub fn pipeline_table(&self, config: &NotecrewConfig) {
        let rows = pipeline_rows(config);
        let widths = column_widths(&rows);

        for (i, row) in rows.iter().enumerate() {
            let line = format_row(row, &widths);
            if i == 0 {
                let rule = "-".repeat(line.len());
                if self.colored {
                    println!("{}{}", TABLE_INDENT, line.bright_white().bold());
                    println!("{}{}", TABLE_INDENT, rule.dimmed());
                } else {
                    println!("{}{}", TABLE_INDENT, line);
                    println!("{}{}", TABLE_INDENT, rule);
                }
            } else {
                println!("{}{}", TABLE_INDENT, line);
            }
        }
    }

    /// `[2/5] fact_check (fact_checker)` as a task starts
    pub fn task_started(&self, index: usize, total: usize, task: &str, agent: &str) {
        let counter = format!("[{}/{}]", index + 1, total);
        if self.colored {
            eprintln!(
                "  {} {} {}",
                counter.dimmed(),
                task.bright_white().bold(),
                format!("({})", agent).dimmed()
            );
        } else {
            eprintln!("  {} {} ({})", counter, task, agent);
        }
    }

    /// Per-task timings and where the notes went, after a successful run
    pub fn run_summary(&self, record: &RunRecord) {
        for output in &record.task_outputs {
            eprintln!("{}", self.status_line(Status::Ok, &task_summary(output)));
        }
        if let Some(path) = &record.output_file {
            eprintln!(
                "{}",
                self.status_line(Status::Ok, &format!("Notes written to {}", path.display()))
            );
        }
        eprintln!(
            "{}",
            self.status_line(
                Status::Info,
                &format!(
                    "{} tasks in {}",
                    record.task_outputs.len(),
                    seconds(record.duration_ms())
                )
            )
        );
    }
}

fn seconds(ms: u64) -> String {
    format!("{:.1}s", ms as f64 / 1000.0)
}

fn task_summary(output: &TaskOutput) -> String {
    format!(
        "{} by {} in {} ({} chars)",
        output.task,
        output.role,
        seconds(output.duration_ms),
        output.output.chars().count()
    )
}

fn pipeline_rows(config: &NotecrewConfig) -> Vec<Vec<String>> {
    let mut rows = vec![["Task", "Agent", "Role", "Context", "Output"]
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()];

    for task in &config.tasks {
        let role = config
            .get_agent(&task.agent)
            .map(|agent| agent.role.clone())
            .unwrap_or_else(|| "?".to_string());
        let context = if task.context.is_empty() {
            "-".to_string()
        } else {
            task.context.join(", ")
        };
        rows.push(vec![
            task.name.clone(),
            task.agent.clone(),
            role,
            context,
            task.output_file.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }

    rows
}

/// Widest cell per column, counted in chars
fn column_widths(rows: &[Vec<String>]) -> Vec<usize> {
    let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    (0..columns)
        .map(|c| {
            rows.iter()
                .filter_map(|r| r.get(c))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect()
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let gap = " ".repeat(COLUMN_GAP);
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join(&gap)
        .trim_end()
        .to_string()
}
