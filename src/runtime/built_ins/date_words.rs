use crate::{
    add_native_word,
    runtime::{
        data_structures::value::Value,
        error::{self, ErrorKind, ScriptError},
        interpreter::Interpreter,
    },
};
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};

/// Dates are exchanged as `DD.MM.YYYY` strings.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Parse a `DD.MM.YYYY` date.  Single digit days and months are accepted.
pub fn parse_date(text: &str) -> error::Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).or_else(|_| {
        ScriptError::bare(
            ErrorKind::InvalidArgument,
            &format!("Invalid date {}, expected DD.MM.YYYY.", Value::stringify(text)),
        )
    })
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn pop_date(interpreter: &mut dyn Interpreter) -> error::Result<NaiveDate> {
    let text = interpreter.pop_as_string()?;
    parse_date(&text)
}

/// Signature: ` -- date`
fn word_today(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let today = Local::now().date_naive();

    interpreter.push(Value::String(format_date(&today)))
}

/// Move a date by a whole number of days.  A complex count uses its real part.
///
/// Signature: `date days -- date`
fn word_date_plus(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack().require(2)?;

    let days = match interpreter.pop()? {
        Value::Real(days) => days,
        Value::Complex(days) => days.re,
        other => {
            return ScriptError::bare(
                ErrorKind::TypeMismatch,
                &format!("dateplus needs a day count, found a {}.", other.type_name()),
            );
        }
    };

    let date = pop_date(interpreter)?;

    let moved = Duration::try_days(days.trunc() as i64)
        .and_then(|delta| date.checked_add_signed(delta));

    match moved {
        Some(moved) => interpreter.push(Value::String(format_date(&moved))),
        None => ScriptError::bare(
            ErrorKind::InvalidArgument,
            &format!("Moving {} by {} days leaves the calendar.", format_date(&date), days),
        ),
    }
}

/// Signature: `date -- weekday`
fn word_day_of_week(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let date = pop_date(interpreter)?;

    interpreter.push(Value::String(weekday_name(date.weekday()).to_string()))
}

/// Split a date into its parts.
///
/// Signature: `date -- year month day`
fn word_extract_day_month_year(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let date = pop_date(interpreter)?;

    interpreter.push(Value::Real(date.year() as f64))?;
    interpreter.push(Value::Real(date.month() as f64))?;
    interpreter.push(Value::Real(date.day() as f64))
}

/// Days from the first date to the second.
///
/// Signature: `from to -- days`
fn word_delta_days(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack().require(2)?;

    let to = pop_date(interpreter)?;
    let from = pop_date(interpreter)?;

    interpreter.push(Value::Real((to - from).num_days() as f64))
}

/// Register the calendar words.
pub fn register_date_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "ddays",
        word_delta_days,
        "Days between two dates.",
        "from to -- days"
    );

    add_native_word!(interpreter, "today", word_today, "Today's date.", " -- date");

    add_native_word!(
        interpreter,
        "dateplus",
        word_date_plus,
        "Add days to a date.",
        "date days -- date"
    );

    add_native_word!(
        interpreter,
        "dow",
        word_day_of_week,
        "Name of the weekday.",
        "date -- weekday"
    );

    add_native_word!(
        interpreter,
        "edmy",
        word_extract_day_month_year,
        "Split a date into year, month and day.",
        "date -- year month day"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_parse_with_or_without_padding() {
        let padded = parse_date("05.03.2024").unwrap();
        let bare = parse_date("5.3.2024").unwrap();

        assert_eq!(padded, bare);
        assert_eq!(format_date(&bare), "05.03.2024");
    }

    #[test]
    fn bad_dates_are_rejected() {
        assert_eq!(parse_date("31.02.2024").unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert!(parse_date("2024-03-05").is_err());
    }

    #[test]
    fn leap_day_is_a_thursday() {
        assert_eq!(weekday_name(parse_date("29.02.2024").unwrap().weekday()), "Thursday");
    }
}
