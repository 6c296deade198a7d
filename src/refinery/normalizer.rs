// * Normalizer: raw collector records -> canonical, deduplicated notes

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info};

use super::dates::process_time;
use super::fields::{extract_id, process_numbers};
use super::regions::is_domestic;
use super::RefineryError;
use crate::config::NormalizerConfig;
use crate::persistence::{read_jsonl, write_jsonl, Note, RawNote};

/// Counters describing one normalization run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub read: usize,
    pub kept: usize,
    pub missing_id: usize,
    pub domestic: usize,
    pub replaced: usize,
}

/// Converts one raw note. `Ok(None)` means the note is dropped on purpose.
pub fn normalize_note(
    raw: RawNote,
    reference: NaiveDate,
) -> Result<Option<Note>, RefineryError> {
    let Some(id) = extract_id(&raw.note_url) else {
        return Ok(None);
    };
    normalize_with_id(raw, id, reference).map(|note| {
        if is_domestic(&note.ip) {
            None
        } else {
            Some(note)
        }
    })
}

fn normalize_with_id(raw: RawNote, id: String, reference: NaiveDate) -> Result<Note, RefineryError> {
    let likes = process_numbers(&raw.likes)?;
    let favorites = process_numbers(&raw.favorites)?;
    let comments = process_numbers(&raw.comments)?;
    let posted = process_time(&raw.time, reference)?;

    Ok(Note {
        id,
        user_nickname: raw.user_nickname,
        title: raw.title,
        text: raw.text,
        tags: raw.tags,
        likes,
        favorites,
        comments,
        time: posted.date,
        ip: posted.region,
        note_url: raw.note_url,
        images: raw.images,
        user_home: raw.user_home,
        avatar_image: raw.avatar_image,
    })
}

/// Normalizes, filters and deduplicates a batch of raw notes.
///
/// Duplicates are keyed by id: the later record replaces the earlier one but
/// keeps the earlier one's position in the output.
pub fn normalize_notes<I>(
    records: I,
    reference: NaiveDate,
) -> Result<(Vec<Note>, NormalizeStats), RefineryError>
where
    I: IntoIterator<Item = RawNote>,
{
    let mut stats = NormalizeStats::default();
    let mut notes: Vec<Note> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for raw in records {
        stats.read += 1;

        let Some(id) = extract_id(&raw.note_url) else {
            debug!(note_url = %raw.note_url, "Dropping note without id");
            stats.missing_id += 1;
            continue;
        };

        let note = normalize_with_id(raw, id, reference)?;

        if is_domestic(&note.ip) {
            stats.domestic += 1;
            continue;
        }

        match positions.get(&note.id) {
            Some(&idx) => {
                stats.replaced += 1;
                notes[idx] = note;
            }
            None => {
                positions.insert(note.id.clone(), notes.len());
                notes.push(note);
            }
        }
    }

    stats.kept = notes.len();
    Ok((notes, stats))
}

/// Runs the normalize stage from file to file
pub fn run(config: &NormalizerConfig) -> Result<NormalizeStats, RefineryError> {
    let raw: Vec<RawNote> = read_jsonl(&config.input)?;
    info!(
        input = %config.input.display(),
        records = raw.len(),
        reference_date = %config.reference_date,
        "Normalizing raw notes"
    );

    let (notes, stats) = normalize_notes(raw, config.reference_date)?;
    write_jsonl(&config.output, &notes)?;

    info!(
        output = %config.output.display(),
        read = stats.read,
        kept = stats.kept,
        missing_id = stats.missing_id,
        domestic = stats.domestic,
        replaced = stats.replaced,
        "Normalization complete"
    );
    Ok(stats)
}
