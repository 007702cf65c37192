/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by filename)
///   2. Built-in embedded levels
///
/// ## Level file format (`.txt`):
///   Optional: `# Level Name`
///   Optional: `## Author: name`
///   Lines: map rows, one digit per cell
///
/// ## Tile legend:
///   '0' = Floor    '1' = Wall     '9' = Goal
///   '2' = Player spawn (floor underneath)
///   '3' = Box spawn (floor underneath)
///
/// Anything else in a map row rejects the level. Rows must all be the
/// same length. Row `y` of the text is grid row `y`, character `x` is
/// column `x`.

use std::path::Path;

use thiserror::Error;

use crate::domain::entity::{Actor, ActorId};
use crate::domain::grid::Grid;
use crate::domain::tile::Tile;

/// A level as listed: metadata plus the untouched map text.
/// The text is parsed on every (re)load, so nothing a session does to
/// its actors can leak into the next load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDef {
    pub name: String,
    pub author: String,
    pub source: String,
}

/// Freshly parsed level: static grid plus actors in spawn state.
/// Actors are ordered players first, then boxes, each in row-major
/// scan order; ids are assigned in that order per kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedLevel {
    pub grid: Grid,
    pub actors: Vec<Actor>,
}

/// MalformedLevel: why a map text was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("malformed level: no map rows")]
    Empty,
    #[error("malformed level: row {row} has {found} cells, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("malformed level: invalid tile {ch:?} at row {row}, column {col}")]
    InvalidTile { row: usize, col: usize, ch: char },
    #[error("no level at index {index}")]
    NotFound { index: usize },
}

// ══════════════════════════════════════════════════════════════
// Map text parsing
// ══════════════════════════════════════════════════════════════

/// Parse map text into a grid and spawn-state actors.
pub fn parse_level(source: &str) -> Result<LoadedLevel, LevelError> {
    let mut rows: Vec<&str> = source.lines().map(|l| l.trim_end_matches('\r')).collect();
    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }
    let expected = match rows.first() {
        Some(r) if !r.is_empty() => r.chars().count(),
        _ => return Err(LevelError::Empty),
    };

    let mut tiles = Vec::with_capacity(rows.len());
    let mut players = vec![];
    let mut boxes = vec![];

    for (y, row) in rows.iter().enumerate() {
        let found = row.chars().count();
        if found != expected {
            return Err(LevelError::Ragged { row: y, expected, found });
        }
        let mut line = Vec::with_capacity(expected);
        for (x, ch) in row.chars().enumerate() {
            let tile = match ch {
                '2' => {
                    players.push(Actor::new(ActorId::player(players.len()), x, y));
                    Tile::Floor
                }
                '3' => {
                    boxes.push(Actor::new(ActorId::boxed(boxes.len()), x, y));
                    Tile::Floor
                }
                _ => Tile::from_digit(ch).ok_or(LevelError::InvalidTile { row: y, col: x, ch })?,
            };
            line.push(tile);
        }
        tiles.push(line);
    }

    let mut actors = players;
    actors.extend(boxes);
    Ok(LoadedLevel { grid: Grid::from_rows(tiles), actors })
}

// ══════════════════════════════════════════════════════════════
// Level file parsing
// ══════════════════════════════════════════════════════════════

/// Split a level file into metadata and map text. The map text is not
/// validated here; that happens on load.
pub fn parse_level_file(content: &str, fallback_name: &str) -> LevelDef {
    let mut name = String::new();
    let mut author = String::new();
    let mut source = String::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("## Author:") {
            author = rest.trim().to_string();
        } else if let Some(rest) = trimmed.strip_prefix('#') {
            if name.is_empty() {
                name = rest.trim_start_matches('#').trim().to_string();
            }
        } else if !(source.is_empty() && trimmed.is_empty()) {
            source.push_str(trimmed);
            source.push('\n');
        }
    }

    if name.is_empty() {
        name = fallback_name.to_string();
    }
    LevelDef { name, author, source }
}

/// Levels for a session: `dir/*.txt` if any exist, else the built-ins.
pub fn load_level_list(dir: &Path) -> Vec<LevelDef> {
    let levels = load_from_directory(dir);
    if levels.is_empty() {
        tracing::info!(dir = %dir.display(), "no level files found, using built-in levels");
        embedded_levels()
    } else {
        tracing::info!(dir = %dir.display(), count = levels.len(), "loaded level files");
        levels
    }
}

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    let mut files: Vec<_> = entries.flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "txt"))
        .collect();
    files.sort();

    let mut results = vec![];
    for path in files {
        let stem = path.file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        match std::fs::read_to_string(&path) {
            Ok(content) => results.push(parse_level_file(&content, &stem)),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable level file"),
        }
    }
    results
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

const EMBEDDED: &[(&str, &str, &str)] = &[
    (
        "First Slide",
        "slidebox",
        "1111111\n\
         1200091\n\
         1111111\n",
    ),
    (
        "Corner",
        "slidebox",
        "11111111\n\
         12000001\n\
         10000001\n\
         10000091\n\
         11111111\n",
    ),
    (
        "Out of the Way",
        "slidebox",
        "1111111\n\
         1230001\n\
         1000001\n\
         1000091\n\
         1111111\n",
    ),
    (
        "Twins",
        "slidebox",
        "11111111\n\
         12000091\n\
         12030001\n\
         10000091\n\
         11111111\n",
    ),
];

pub fn embedded_levels() -> Vec<LevelDef> {
    EMBEDDED.iter()
        .map(|&(name, author, source)| LevelDef {
            name: name.to_string(),
            author: author.to_string(),
            source: source.to_string(),
        })
        .collect()
}
