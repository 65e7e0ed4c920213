//! Plot-ready frames for a projected table.
//!
//! Marks are coerced to numbers here: symbolic tokens and missing cells both
//! become absent. Rendering is left to the client.

use serde::Serialize;

use crate::model::MarkGrid;

pub const HEATMAP_MIN: u64 = 0;
pub const HEATMAP_MAX: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub usn: String,
    pub subjects: Vec<String>,
    pub marks: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub subjects: Vec<String>,
    pub usns: Vec<String>,
    /// One row per student, one column per subject.
    pub values: Vec<Vec<Option<u64>>>,
    pub min: u64,
    pub max: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSeries {
    pub subject: String,
    pub marks: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrames {
    pub lines: Vec<LineSeries>,
    pub heatmap: Heatmap,
    pub histograms: Vec<HistogramSeries>,
}

/// Numeric-or-absent view of every row.
#[must_use]
pub fn numeric_matrix<T: MarkGrid>(table: &T) -> Vec<Vec<Option<u64>>> {
    table
        .rows()
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .map(|cell| cell.mark().and_then(|mark| mark.as_number()))
                .collect()
        })
        .collect()
}

#[must_use]
pub fn build_chart_frames<T: MarkGrid>(table: &T) -> ChartFrames {
    let subjects = table.subjects().to_vec();
    let values = numeric_matrix(table);

    let lines = table
        .rows()
        .iter()
        .zip(&values)
        .filter_map(|(row, marks)| {
            let (plotted_subjects, plotted_marks): (Vec<String>, Vec<u64>) = subjects
                .iter()
                .zip(marks)
                .filter_map(|(subject, mark)| mark.map(|mark| (subject.clone(), mark)))
                .unzip();
            (!plotted_marks.is_empty()).then(|| LineSeries {
                usn: row.usn.clone(),
                subjects: plotted_subjects,
                marks: plotted_marks,
            })
        })
        .collect();

    let histograms = subjects
        .iter()
        .enumerate()
        .filter_map(|(index, subject)| {
            let marks = values
                .iter()
                .filter_map(|row| row.get(index).copied().flatten())
                .collect::<Vec<_>>();
            (!marks.is_empty()).then(|| HistogramSeries {
                subject: subject.clone(),
                marks,
            })
        })
        .collect();

    ChartFrames {
        lines,
        heatmap: Heatmap {
            subjects,
            usns: table.rows().iter().map(|row| row.usn.clone()).collect(),
            values,
            min: HEATMAP_MIN,
            max: HEATMAP_MAX,
        },
        histograms,
    }
}
