use bandwave_core::config::DEFAULT_TABLE_SIZE;
use bandwave_core::error::{WaveformError, check_sample_rate};
use bandwave_core::pitch::{MAX_NOTE, midi_note_to_hz};
use bandwave_core::Result;
use tracing::debug;

use super::table::LookupTable;

/// Lookup tables for one waveform, one per `notes_per_table`-wide note bucket.
///
/// Table `i` serves notes from `i * notes_per_table + 0.5` up to
/// `(i + 1) * notes_per_table + 0.5` and is band limited for the top of that
/// range, so every note mapped onto it keeps its harmonics below Nyquist.
/// Tables are built for every bucket that starts at or below note 127; the
/// last one may therefore be limited for a note above the MIDI range.
#[derive(Debug, Clone)]
pub struct LookupTableBank {
    tables: Box<[LookupTable]>,
    notes_per_table: u32,
}

impl LookupTableBank {
    pub fn new<F>(function: F, sample_rate: f64, notes_per_table: u32, table_size: usize) -> Result<Self>
    where
        F: Fn(f64, f64, f64) -> f64,
    {
        check_sample_rate(sample_rate)?;
        if notes_per_table == 0 {
            return Err(WaveformError::InvalidNotesPerTable);
        }

        let bucket_count = (0..)
            .take_while(|&i| Self::bucket_start(notes_per_table, i) <= MAX_NOTE)
            .count();

        let tables = (0..bucket_count)
            .map(|i| {
                let note = Self::note_for_index(notes_per_table, i);
                let frequency = midi_note_to_hz(note);
                debug!(note, frequency, table_size, "building lookup table");
                LookupTable::new(&function, sample_rate, frequency, table_size)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            tables: tables.into_boxed_slice(),
            notes_per_table,
        })
    }

    /// Bank with the default table resolution.
    pub fn with_default_size<F>(function: F, sample_rate: f64, notes_per_table: u32) -> Result<Self>
    where
        F: Fn(f64, f64, f64) -> f64,
    {
        Self::new(function, sample_rate, notes_per_table, DEFAULT_TABLE_SIZE)
    }

    fn bucket_start(notes_per_table: u32, index: usize) -> f64 {
        f64::from(notes_per_table) * index as f64 + 0.5
    }

    fn note_for_index(notes_per_table: u32, index: usize) -> f64 {
        Self::bucket_start(notes_per_table, index + 1)
    }

    /// Bucket for `note`, clamped to the bank. Total over all inputs; NaN maps
    /// to the first table.
    #[inline]
    pub fn table_index_for_note(&self, note: f32) -> usize {
        let bucket = ((note - 0.5) / self.notes_per_table as f32).floor();
        let last = (self.tables.len() - 1) as f32;
        bucket.clamp(0.0, last) as usize
    }

    /// Interpolated sample of the table serving `note`.
    #[inline]
    pub fn sample(&self, note: f32, phase: f32) -> f32 {
        self.tables[self.table_index_for_note(note)].sample_at(phase)
    }

    /// Direct table access for callers that already resolved the index.
    #[inline]
    pub fn table(&self, index: usize) -> &LookupTable {
        &self.tables[index]
    }

    pub fn tables(&self) -> &[LookupTable] {
        &self.tables
    }

    /// Note whose frequency table `index` was band limited for.
    pub fn representative_note(&self, index: usize) -> f64 {
        Self::note_for_index(self.notes_per_table, index)
    }

    pub fn notes_per_table(&self) -> u32 {
        self.notes_per_table
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
