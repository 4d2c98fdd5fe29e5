//! Reading program images from text files.
//!
//! ```text
//! # comments run to the end of the line
//! bank 0 100 extended 1000 base 0
//! 107000000123    # LA,U A0,0123
//! 777760000000    # HALT 0
//! start 0 100 1000
//! ```
//!
//! All numbers are octal except base register numbers, which are
//! decimal as in B12.  A `bank` line gives the level, BDI, type
//! (`basic` or `extended`) and lower limit of a bank, and optionally
//! the base register it is based on at load time and `large` for a
//! large bank; the octal words which follow are its contents.  The `start` line gives the bank
//! and offset at which execution begins, followed by `basic` for a
//! basic mode program.
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use base::prelude::*;
use cpu::{BankImage, BankType, LevelBdi, ProgramImage, ProgramStart};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageParseError {
    UnknownDirective { line: usize, directive: String },
    MissingField { line: usize, field: &'static str },
    BadNumber { line: usize, text: String },
    BadBankType { line: usize, text: String },
    UnexpectedField { line: usize, text: String },
    WordOutsideBank { line: usize },
    DuplicateStart { line: usize },
    MissingStart,
}

impl Display for ImageParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        use ImageParseError::*;
        match self {
            UnknownDirective { line, directive } => {
                write!(f, "line {line}: unknown directive '{directive}'")
            }
            MissingField { line, field } => write!(f, "line {line}: missing {field}"),
            BadNumber { line, text } => {
                write!(f, "line {line}: '{text}' is not a valid number")
            }
            BadBankType { line, text } => write!(
                f,
                "line {line}: bank type must be 'basic' or 'extended', not '{text}'"
            ),
            UnexpectedField { line, text } => write!(f, "line {line}: unexpected '{text}'"),
            WordOutsideBank { line } => {
                write!(f, "line {line}: data word appears before any bank line")
            }
            DuplicateStart { line } => write!(f, "line {line}: only one start line is allowed"),
            MissingStart => f.write_str("the image has no start line"),
        }
    }
}

impl Error for ImageParseError {}

fn octal(line: usize, text: &str) -> Result<u64, ImageParseError> {
    let digits = text.strip_prefix("0o").unwrap_or(text);
    u64::from_str_radix(digits, 8).map_err(|_| ImageParseError::BadNumber {
        line,
        text: text.to_string(),
    })
}

fn bounded<T: TryFrom<u64>>(line: usize, text: &str) -> Result<T, ImageParseError> {
    T::try_from(octal(line, text)?).map_err(|_| ImageParseError::BadNumber {
        line,
        text: text.to_string(),
    })
}

struct Fields<'a, I: Iterator<Item = &'a str>> {
    line: usize,
    rest: I,
}

impl<'a, I: Iterator<Item = &'a str>> Fields<'a, I> {
    fn required(&mut self, field: &'static str) -> Result<&'a str, ImageParseError> {
        self.rest.next().ok_or(ImageParseError::MissingField {
            line: self.line,
            field,
        })
    }

    fn level_bdi(&mut self) -> Result<LevelBdi, ImageParseError> {
        let level: u8 = bounded(self.line, self.required("level")?)?;
        let bdi: u16 = bounded(self.line, self.required("bank descriptor index")?)?;
        if level > 0o7 || bdi > 0o77_777 {
            return Err(ImageParseError::BadNumber {
                line: self.line,
                text: format!("{level:o},{bdi:o}"),
            });
        }
        Ok(LevelBdi::new(level, bdi))
    }

    fn base_register(&mut self) -> Result<usize, ImageParseError> {
        let text = self.required("base register")?;
        text.parse().map_err(|_| ImageParseError::BadNumber {
            line: self.line,
            text: text.to_string(),
        })
    }

    fn finish(mut self) -> Result<(), ImageParseError> {
        match self.rest.next() {
            None => Ok(()),
            Some(text) => Err(ImageParseError::UnexpectedField {
                line: self.line,
                text: text.to_string(),
            }),
        }
    }
}

struct PendingBank {
    level_bdi: LevelBdi,
    bank_type: BankType,
    lower_limit: u32,
    base_register: Option<usize>,
    large_size: bool,
    words: Vec<Word36>,
}

impl PendingBank {
    fn into_image(self) -> BankImage {
        let bank = match self.bank_type {
            BankType::Basic => BankImage::basic(self.level_bdi, self.lower_limit, self.words),
            BankType::Extended => {
                BankImage::extended(self.level_bdi, self.lower_limit, self.words)
            }
        };
        let bank = if self.large_size { bank.large() } else { bank };
        match self.base_register {
            Some(index) => bank.based_on(index),
            None => bank,
        }
    }
}

/// Parse the text of an image file.  The interrupt environment is not
/// included.
pub fn parse_image(text: &str) -> Result<ProgramImage, ImageParseError> {
    let mut banks: Vec<PendingBank> = Vec::new();
    let mut start: Option<ProgramStart> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        let mut words = content.split_whitespace();
        let Some(first) = words.next() else {
            continue;
        };
        let mut fields = Fields { line, rest: words };
        match first {
            "bank" => {
                let level_bdi = fields.level_bdi()?;
                let bank_type = match fields.required("bank type")? {
                    "basic" => BankType::Basic,
                    "extended" => BankType::Extended,
                    other => {
                        return Err(ImageParseError::BadBankType {
                            line,
                            text: other.to_string(),
                        })
                    }
                };
                let lower_limit: u32 = bounded(line, fields.required("lower limit")?)?;
                let mut base_register = None;
                let mut large_size = false;
                while let Some(option) = fields.rest.next() {
                    match option {
                        "base" if base_register.is_none() => {
                            base_register = Some(fields.base_register()?);
                        }
                        "large" if !large_size => large_size = true,
                        other => {
                            return Err(ImageParseError::UnexpectedField {
                                line,
                                text: other.to_string(),
                            })
                        }
                    }
                }
                banks.push(PendingBank {
                    level_bdi,
                    bank_type,
                    lower_limit,
                    base_register,
                    large_size,
                    words: Vec::new(),
                });
            }
            "start" => {
                if start.is_some() {
                    return Err(ImageParseError::DuplicateStart { line });
                }
                let level_bdi = fields.level_bdi()?;
                let offset: u32 = bounded(line, fields.required("offset")?)?;
                let program_start = match fields.rest.next() {
                    None => ProgramStart::extended(level_bdi, offset),
                    Some("basic") => ProgramStart::basic(level_bdi, offset),
                    Some(other) => {
                        return Err(ImageParseError::UnexpectedField {
                            line,
                            text: other.to_string(),
                        })
                    }
                };
                fields.finish()?;
                start = Some(program_start);
            }
            word if word.starts_with(|c: char| c.is_ascii_digit()) => {
                let value = Word36::try_from(octal(line, word)?).map_err(|_| {
                    ImageParseError::BadNumber {
                        line,
                        text: word.to_string(),
                    }
                })?;
                fields.finish()?;
                banks
                    .last_mut()
                    .ok_or(ImageParseError::WordOutsideBank { line })?
                    .words
                    .push(value);
            }
            directive => {
                return Err(ImageParseError::UnknownDirective {
                    line,
                    directive: directive.to_string(),
                })
            }
        }
    }

    let start = start.ok_or(ImageParseError::MissingStart)?;
    Ok(banks
        .into_iter()
        .fold(ProgramImage::new(start), |image, bank| {
            image.with_bank(bank.into_image())
        }))
}
