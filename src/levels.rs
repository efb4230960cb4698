use std::fs;

use crate::error::ParseError;
use crate::parse::parse_puzzle;
use crate::sokoban::Sokoban;

/// A collection of puzzles read from one `;`-separated XSB-style level file:
/// lines starting with `;`, and blank lines between levels, both act as
/// separators.
#[derive(Debug)]
pub struct Levels {
    levels: Vec<Sokoban>,
}

impl Levels {
    pub fn from_text(contents: &str) -> Result<Self, ParseError> {
        fn flush(current: &mut String, levels: &mut Vec<Sokoban>) -> Result<(), ParseError> {
            if !current.is_empty() {
                let level_str = current.trim_end();
                let level_number = levels.len() + 1;
                let parsed = parse_puzzle(level_str)
                    .map_err(|err| ParseError::InvalidLevel(format!("level {level_number}: {err}")))?;
                levels.push(parsed);
                current.clear();
            }
            Ok(())
        }

        let mut levels = Vec::new();
        let mut current = String::new();

        for line in contents.lines() {
            if line.trim_start().starts_with(';') {
                flush(&mut current, &mut levels)?;
                continue;
            }
            if line.is_empty() {
                flush(&mut current, &mut levels)?;
                continue;
            }
            current.push_str(line);
            current.push('\n');
        }
        flush(&mut current, &mut levels)?;

        Ok(Levels { levels })
    }

    pub fn from_file(path: &str) -> Result<Self, ParseError> {
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    pub fn get(&self, index: usize) -> Option<&Sokoban> {
        self.levels.get(index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
