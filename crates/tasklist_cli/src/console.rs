//! Line-oriented terminal I/O.
//!
//! The console owns its input and output handles and is handed to the
//! shell explicitly; dropping it releases both.

use std::io::{BufRead, Write};
use tasklist_core::error::AppError;
use tasklist_core::model::{Difficulty, Priority, TaskStatus, TaskUpdate};
use tasklist_core::validation::{
    check_day_format, check_month_format, check_year_format, date_to_string, parse_difficulty,
    parse_due_date, parse_priority_choice, parse_status_choice, require_text,
};
use time::{Date, OffsetDateTime};

const PROMPT: &str = "> ";

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Next line without its terminator, or `None` at end of input.
    pub fn read_line(&mut self) -> Result<Option<String>, AppError> {
        let mut line = String::new();
        let bytes = self.input.read_line(&mut line)?;
        if bytes == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub fn prompt(&mut self, question: &str) -> Result<Option<String>, AppError> {
        writeln!(self.output, "{question}")?;
        write!(self.output, "{PROMPT}")?;
        self.output.flush()?;
        self.read_line()
    }

    /// Ask until `parse` accepts the answer. Retryable rejections are echoed
    /// back; anything else, or end of input, aborts.
    pub fn ask<T>(
        &mut self,
        question: &str,
        parse: impl Fn(&str) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        loop {
            let Some(answer) = self.prompt(question)? else {
                return Err(AppError::invalid_input("input ended before a value was given"));
            };

            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() => {
                    writeln!(self.output, "{}. Try again.", err.message())?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub fn ask_title(&mut self) -> Result<String, AppError> {
        self.ask("Title:", |answer| require_text("title", answer))
    }

    pub fn ask_description(&mut self) -> Result<String, AppError> {
        self.ask("Description:", |answer| require_text("description", answer))
    }

    pub fn ask_priority(&mut self) -> Result<Priority, AppError> {
        let menu = numbered_menu("Priority:", Priority::ALL.iter().map(|p| p.label()));
        self.ask(&menu, parse_priority_choice)
    }

    pub fn ask_status(&mut self) -> Result<TaskStatus, AppError> {
        let menu = numbered_menu("Status:", TaskStatus::ALL.iter().map(|s| s.label()));
        self.ask(&menu, parse_status_choice)
    }

    /// Blank answer keeps the default difficulty.
    pub fn ask_difficulty(&mut self) -> Result<Difficulty, AppError> {
        let question = format!("Difficulty 1-5 (blank for {}):", Difficulty::DEFAULT);
        self.ask(&question, |answer| {
            if answer.trim().is_empty() {
                Ok(Difficulty::DEFAULT)
            } else {
                parse_difficulty(answer)
            }
        })
    }

    /// Year, month and day are asked one at a time; the whole date is asked
    /// again when the triple is not a day after `today`.
    pub fn ask_due_date(&mut self, today: Date) -> Result<OffsetDateTime, AppError> {
        loop {
            let year = self.ask("Due date - year (YYYY):", |answer| {
                component(answer, check_year_format, "year must be four digits")
            })?;
            let month = self.ask("Due date - month (MM):", |answer| {
                component(answer, check_month_format, "month must be 01-12")
            })?;
            let day = self.ask("Due date - day (DD):", |answer| {
                component(answer, check_day_format, "day must be 01-31")
            })?;

            match parse_due_date(&date_to_string(&year, &month, &day), today) {
                Ok(due_at) => return Ok(due_at),
                Err(err) if err.is_retryable() => {
                    writeln!(self.output, "{}. Try again.", err.message())?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Field menu used by an interactive edit with no flags.
    pub fn ask_field_update(&mut self, today: Date) -> Result<TaskUpdate, AppError> {
        let fields = [
            "title",
            "description",
            "priority",
            "status",
            "due date",
            "difficulty",
        ];
        let menu = numbered_menu("Field to edit:", fields.into_iter());
        let choice = self.ask(&menu, |answer| {
            answer
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|choice| (1..=fields.len()).contains(choice))
                .ok_or_else(|| AppError::invalid_input("choose a listed field"))
        })?;

        Ok(match choice {
            1 => TaskUpdate::Title(self.ask_title()?),
            2 => TaskUpdate::Description(self.ask_description()?),
            3 => TaskUpdate::Priority(self.ask_priority()?),
            4 => TaskUpdate::Status(self.ask_status()?),
            5 => TaskUpdate::DueAt(self.ask_due_date(today)?),
            _ => TaskUpdate::Difficulty(self.ask_difficulty()?),
        })
    }
}

fn component(answer: &str, check: fn(&str) -> bool, message: &str) -> Result<String, AppError> {
    let trimmed = answer.trim();
    if check(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(AppError::invalid_input(message))
    }
}

fn numbered_menu<'a>(title: &str, options: impl Iterator<Item = &'a str>) -> String {
    let mut menu = title.to_string();
    for (index, option) in options.enumerate() {
        menu.push_str(&format!("\n[{}] {}", index + 1, option));
    }
    menu
}
