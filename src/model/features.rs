//! Champion selection → fixed-size numeric feature vector.
//!
//! A selection is validated strictly: 1 to 5 champions per side and no id 0.
//! Nothing is truncated or coerced; invalid requests are rejected.

use crate::data::table::{
    validate_roster, ChampionId, MatchRecord, MatchTable, Side, MAX_ROSTER_SIZE,
};
use crate::error::AppError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_POSITIONAL_BOUND: usize = 1000;

/// A validated prediction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    team: Vec<ChampionId>,
    enemy: Vec<ChampionId>,
}

impl Selection {
    pub fn new(team: Vec<ChampionId>, enemy: Vec<ChampionId>) -> Result<Self, AppError> {
        validate_roster("team", &team)?;
        validate_roster("enemy", &enemy)?;
        Ok(Selection { team, enemy })
    }

    pub fn from_record(record: &MatchRecord) -> Result<Self, AppError> {
        Self::new(
            record.team.iter().map(|s| s.champion).collect(),
            record.enemy.iter().map(|s| s.champion).collect(),
        )
    }

    pub fn team(&self) -> &[ChampionId] {
        &self.team
    }

    pub fn enemy(&self) -> &[ChampionId] {
        &self.enemy
    }
}

/// How a selection is laid out as numbers. A trained model stores the
/// encoding it was fitted with and is always queried through it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum Encoding {
    /// `[team(5), enemy(5)]`, each side zero-padded.
    #[default]
    Padded,
    /// One cell per champion id below `bound`: +1 ally, -1 enemy, 0 absent.
    /// A table encodes densely, so it costs `rows * bound * 8` bytes
    /// (about 800 MB for 100 000 matches at the default bound).
    Positional { bound: usize },
}

impl Encoding {
    pub fn positional() -> Self {
        Encoding::Positional {
            bound: DEFAULT_POSITIONAL_BOUND,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Encoding::Padded => 2 * MAX_ROSTER_SIZE,
            Encoding::Positional { bound } => *bound,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Padded => "padded",
            Encoding::Positional { .. } => "positional",
        }
    }

    pub fn encode(&self, selection: &Selection) -> Vec<f64> {
        let mut out = vec![0.0; self.len()];
        match self {
            Encoding::Padded => {
                for (cell, &id) in out.iter_mut().zip(&selection.team) {
                    *cell = id as f64;
                }
                for (cell, &id) in out[MAX_ROSTER_SIZE..].iter_mut().zip(&selection.enemy) {
                    *cell = id as f64;
                }
            }
            Encoding::Positional { bound } => {
                let mut presence = vec![0u8; *bound];
                mark_presence(&mut presence, *bound, &selection.team, ALLY_BIT);
                mark_presence(&mut presence, *bound, &selection.enemy, ENEMY_BIT);
                for (cell, flags) in out.iter_mut().zip(&presence) {
                    *cell = presence_value(*flags);
                }
            }
        }
        out
    }

    /// Encodes every usable row of a raw table, column by column.
    ///
    /// Rows with no outcome or an empty roster on either side are skipped.
    /// Each kept row is identical to encoding that row's [`Selection`].
    pub fn encode_table(&self, table: &MatchTable) -> Result<EncodedTable, AppError> {
        let outcomes = table.outcomes()?;
        let team_slots = table.require_slot_columns(Side::Team)?;
        let enemy_slots = table.require_slot_columns(Side::Enemy)?;
        let rows = table.len();
        let width = self.len();

        let mut team_filled = vec![0usize; rows];
        let mut enemy_filled = vec![0usize; rows];
        let mut data = vec![0.0; rows * width];

        match self {
            Encoding::Padded => {
                for (side, slots, filled) in [
                    (Side::Team, &team_slots, &mut team_filled),
                    (Side::Enemy, &enemy_slots, &mut enemy_filled),
                ] {
                    let offset = match side {
                        Side::Team => 0,
                        Side::Enemy => MAX_ROSTER_SIZE,
                    };
                    for column in slots.iter() {
                        for (row, cell) in column.champions.iter().enumerate() {
                            let Some(id) = *cell else { continue };
                            if filled[row] < MAX_ROSTER_SIZE {
                                data[row * width + offset + filled[row]] = id as f64;
                            }
                            filled[row] += 1;
                        }
                    }
                }
            }
            Encoding::Positional { bound } => {
                let mut presence = vec![0u8; rows * width];
                for (slots, filled, bit) in [
                    (&team_slots, &mut team_filled, ALLY_BIT),
                    (&enemy_slots, &mut enemy_filled, ENEMY_BIT),
                ] {
                    for column in slots.iter() {
                        for (row, cell) in column.champions.iter().enumerate() {
                            let Some(id) = *cell else { continue };
                            filled[row] += 1;
                            let id = id as usize;
                            if id > 0 && id < *bound {
                                presence[row * width + id] |= bit;
                            }
                        }
                    }
                }
                for (cell, flags) in data.iter_mut().zip(&presence) {
                    *cell = presence_value(*flags);
                }
            }
        }

        let mut features = FeatureMatrix::with_capacity(width, rows);
        let mut labels = Vec::with_capacity(rows);
        let mut skipped = 0;
        for row in 0..rows {
            let usable = team_filled[row] > 0 && enemy_filled[row] > 0;
            match outcomes[row] {
                Some(won) if usable => {
                    features.push_row(&data[row * width..(row + 1) * width]);
                    labels.push(if won { 1.0 } else { 0.0 });
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} of {} rows while encoding", skipped, rows);
        }

        Ok(EncodedTable {
            features,
            labels,
            skipped,
        })
    }
}

const ALLY_BIT: u8 = 0b01;
const ENEMY_BIT: u8 = 0b10;

fn mark_presence(presence: &mut [u8], bound: usize, roster: &[ChampionId], bit: u8) {
    for &id in roster {
        let id = id as usize;
        // Out-of-bound ids are treated as absent rather than wrapped.
        if id > 0 && id < bound {
            presence[id] |= bit;
        }
    }
}

fn presence_value(flags: u8) -> f64 {
    match flags {
        ALLY_BIT => 1.0,
        ENEMY_BIT => -1.0,
        _ => 0.0,
    }
}

/// Row-major matrix of encoded selections.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    cols: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    pub fn new(cols: usize) -> Self {
        FeatureMatrix {
            cols,
            data: Vec::new(),
        }
    }

    pub fn with_capacity(cols: usize, rows: usize) -> Self {
        FeatureMatrix {
            cols,
            data: Vec::with_capacity(cols * rows),
        }
    }

    pub fn push_row(&mut self, row: &[f64]) {
        debug_assert_eq!(row.len(), self.cols);
        self.data.extend_from_slice(row);
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        if self.cols == 0 {
            0
        } else {
            self.data.len() / self.cols
        }
    }

    pub fn row(&self, idx: usize) -> &[f64] {
        &self.data[idx * self.cols..(idx + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.cols.max(1))
    }

    pub fn view(&self) -> RowView<'_> {
        RowView {
            matrix: self,
            indices: None,
        }
    }

    /// The given rows, in order, without copying them.
    pub fn view_rows<'a>(&'a self, indices: &'a [usize]) -> RowView<'a> {
        RowView {
            matrix: self,
            indices: Some(indices),
        }
    }
}

/// Borrowed rows of a [`FeatureMatrix`]: all of them, or an index subset.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    matrix: &'a FeatureMatrix,
    indices: Option<&'a [usize]>,
}

impl<'a> RowView<'a> {
    pub fn cols(&self) -> usize {
        self.matrix.cols()
    }

    pub fn rows(&self) -> usize {
        match self.indices {
            Some(indices) => indices.len(),
            None => self.matrix.rows(),
        }
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &'a [f64]> + 'a {
        let matrix = self.matrix;
        let indices = self.indices;
        (0..self.rows()).map(move |i| matrix.row(indices.map_or(i, |idx| idx[i])))
    }
}

impl<'a> From<&'a FeatureMatrix> for RowView<'a> {
    fn from(matrix: &'a FeatureMatrix) -> Self {
        matrix.view()
    }
}

#[derive(Debug, Clone)]
pub struct EncodedTable {
    pub features: FeatureMatrix,
    pub labels: Vec<f64>,
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::{MatchRecord, Slot};

    fn selection(team: &[ChampionId], enemy: &[ChampionId]) -> Selection {
        Selection::new(team.to_vec(), enemy.to_vec()).unwrap()
    }

    #[test]
    fn test_padded_length_and_padding() {
        let vec = Encoding::Padded.encode(&selection(&[1, 2, 3], &[4, 5]));
        assert_eq!(vec.len(), 10);

        let vec = Encoding::Padded.encode(&selection(&[1], &[2, 3, 4]));
        assert_eq!(&vec[..5], &[1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(&vec[5..], &[2.0, 3.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn test_positional_marks_sides() {
        let vec = Encoding::positional().encode(&selection(&[1], &[2, 3, 4]));
        assert_eq!(vec.len(), DEFAULT_POSITIONAL_BOUND);
        assert_eq!(vec[1], 1.0);
        assert_eq!(&vec[2..5], &[-1.0, -1.0, -1.0]);
        let nonzero = vec.iter().filter(|v| **v != 0.0).count();
        assert_eq!(nonzero, 4);
        assert_eq!(vec[0], 0.0);
    }

    #[test]
    fn test_positional_out_of_bound_and_duplicates() {
        let encoding = Encoding::Positional { bound: 10 };
        let vec = encoding.encode(&selection(&[3, 3, 42], &[7, 3]));
        assert_eq!(vec.len(), 10);
        // 3 is on both sides, 42 is past the bound.
        assert_eq!(vec[3], 0.0);
        assert_eq!(vec[7], -1.0);
        assert_eq!(vec.iter().filter(|v| **v != 0.0).count(), 1);
    }

    #[test]
    fn test_every_valid_size_has_fixed_length() {
        for encoding in [Encoding::Padded, Encoding::positional()] {
            for n in 1..=5 {
                for m in 1..=5 {
                    let team: Vec<ChampionId> = (1..=n).collect();
                    let enemy: Vec<ChampionId> = (10..10 + m).collect();
                    let sel = selection(&team, &enemy);
                    let a = encoding.encode(&sel);
                    let b = encoding.encode(&sel);
                    assert_eq!(a.len(), encoding.len());
                    assert_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn test_validation_rejects_bad_rosters() {
        assert!(matches!(
            Selection::new(vec![], vec![1]),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            Selection::new(vec![1, 2, 3, 4, 5, 6], vec![1]),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            Selection::new(vec![1], vec![0]),
            Err(AppError::InvalidInput(_))
        ));
        assert!(Selection::new(vec![1, 1], vec![2]).is_ok());
    }

    #[test]
    fn test_table_encoding_matches_row_encoding() {
        let records = vec![
            MatchRecord::new(&[1, 2, 3], &[4, 5], true).unwrap(),
            MatchRecord::with_slots(
                vec![Slot::new(9), Slot::new(8), Slot::new(7), Slot::new(6), Slot::new(5)],
                vec![Slot::new(1), Slot::new(2), Slot::new(3), Slot::new(4), Slot::new(999)],
                false,
            )
            .unwrap(),
        ];
        let table = MatchTable::from_records(&records).unwrap();

        for encoding in [Encoding::Padded, Encoding::Positional { bound: 50 }] {
            let encoded = encoding.encode_table(&table).unwrap();
            assert_eq!(encoded.features.rows(), 2);
            assert_eq!(encoded.labels, vec![1.0, 0.0]);
            for (row, record) in records.iter().enumerate() {
                let expected = encoding.encode(&Selection::from_record(record).unwrap());
                assert_eq!(encoded.features.row(row), expected.as_slice());
            }
        }
    }

    #[test]
    fn test_table_encoding_packs_gaps_and_skips_unusable_rows() {
        let mut table = MatchTable::new();
        table
            .insert_column("team_champ1", vec![None, Some(1), None])
            .unwrap();
        table
            .insert_column("team_champ2", vec![Some(5), Some(2), None])
            .unwrap();
        table
            .insert_column("enemy_champ1", vec![Some(3), Some(4), Some(6)])
            .unwrap();
        table
            .insert_column("team_win", vec![Some(1), None, Some(0)])
            .unwrap();

        let encoded = Encoding::Padded.encode_table(&table).unwrap();
        assert_eq!(encoded.features.rows(), 1);
        assert_eq!(encoded.skipped, 2);
        assert_eq!(
            encoded.features.row(0),
            &[5.0, 0.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_encoding_serde_tag() {
        let json = serde_json::to_string(&Encoding::Positional { bound: 12 }).unwrap();
        assert_eq!(json, r#"{"scheme":"positional","bound":12}"#);
        let back: Encoding = serde_json::from_str(r#"{"scheme":"padded"}"#).unwrap();
        assert_eq!(back, Encoding::Padded);
        assert_eq!(Encoding::default(), Encoding::Padded);
    }

    #[test]
    fn test_row_view_borrows_selected_rows() {
        let mut matrix = FeatureMatrix::new(2);
        for i in 0..4 {
            matrix.push_row(&[i as f64, 10.0 * i as f64]);
        }

        let all = matrix.view();
        assert_eq!(all.rows(), 4);
        assert_eq!(all.iter_rows().count(), 4);

        let picked = [3, 1];
        let view = matrix.view_rows(&picked);
        assert_eq!(view.rows(), 2);
        assert_eq!(view.cols(), 2);
        let rows: Vec<&[f64]> = view.iter_rows().collect();
        assert_eq!(rows, vec![&[3.0, 30.0][..], &[1.0, 10.0][..]]);
    }
}
