//! Fixed-binning histograms and the book which holds them by name

use crate::{
    error::{AnalysisError, AnalysisResult},
    numeric::Float,
};

use indexmap::IndexMap;

/// Regular binning of one axis
///
/// Bin 0 is the underflow bin and bin `num_bins + 1` is the overflow bin, the
/// regular bins cover [low, high[.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    num_bins: usize,
    low: Float,
    high: Float,
}
//
impl Axis {
    /// Set up a binning of num_bins regular bins between low and high
    pub fn new(num_bins: usize, low: Float, high: Float) -> Self {
        assert!(num_bins > 0, "An axis needs at least one bin");
        assert!(low < high, "Axis bounds must be ordered");
        Self { num_bins, low, high }
    }

    /// Number of regular bins
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Lower bound of the regular bins
    pub fn low(&self) -> Float {
        self.low
    }

    /// Upper bound of the regular bins
    pub fn high(&self) -> Float {
        self.high
    }

    /// Bin width
    pub fn bin_width(&self) -> Float {
        (self.high - self.low) / self.num_bins as Float
    }

    /// Lower edge of a regular bin (1-based, as in `bin()`)
    pub fn bin_low_edge(&self, bin: usize) -> Float {
        self.low + (bin - 1) as Float * self.bin_width()
    }

    /// Bin into which a value falls, or None for NaN
    pub fn bin(&self, x: Float) -> Option<usize> {
        if x.is_nan() {
            None
        } else if x < self.low {
            Some(0)
        } else if x >= self.high {
            Some(self.num_bins + 1)
        } else {
            let bin = ((x - self.low) / self.bin_width()) as usize;
            Some(bin.min(self.num_bins - 1) + 1)
        }
    }
}

/// Binning of a histogram of either dimension
#[derive(Clone, Debug, PartialEq)]
pub struct Binning {
    /// First axis
    pub x: Axis,

    /// Second axis, for 2-D histograms
    pub y: Option<Axis>,
}
//
impl Binning {
    /// Binning of a 1-D histogram
    pub fn one_d(num_bins: usize, low: Float, high: Float) -> Self {
        Self {
            x: Axis::new(num_bins, low, high),
            y: None,
        }
    }

    /// Binning of a 2-D histogram
    pub fn two_d(x: (usize, Float, Float), y: (usize, Float, Float)) -> Self {
        Self {
            x: Axis::new(x.0, x.1, x.2),
            y: Some(Axis::new(y.0, y.1, y.2)),
        }
    }

    /// Number of axes
    pub fn dimension(&self) -> usize {
        if self.y.is_some() {
            2
        } else {
            1
        }
    }
}

/// One-dimensional histogram
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram1D {
    axis: Axis,
    counts: Vec<u64>,
}
//
impl Histogram1D {
    /// Empty histogram
    pub fn new(axis: Axis) -> Self {
        let counts = vec![0; axis.num_bins() + 2];
        Self { axis, counts }
    }

    /// Binning
    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    /// Count a value. NaN is ignored.
    pub fn fill(&mut self, x: Float) {
        if let Some(bin) = self.axis.bin(x) {
            self.counts[bin] += 1;
        }
    }

    /// Content of a bin, including under/overflow
    pub fn count(&self, bin: usize) -> u64 {
        self.counts[bin]
    }

    /// Number of values that were counted, including under/overflow
    pub fn entries(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Two-dimensional histogram
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram2D {
    x_axis: Axis,
    y_axis: Axis,
    /// Row-major over y, including the under/overflow bins of both axes
    counts: Vec<u64>,
}
//
impl Histogram2D {
    /// Empty histogram
    pub fn new(x_axis: Axis, y_axis: Axis) -> Self {
        let counts = vec![0; (x_axis.num_bins() + 2) * (y_axis.num_bins() + 2)];
        Self { x_axis, y_axis, counts }
    }

    /// Binning of the x axis
    pub fn x_axis(&self) -> &Axis {
        &self.x_axis
    }

    /// Binning of the y axis
    pub fn y_axis(&self) -> &Axis {
        &self.y_axis
    }

    /// Count a value pair. Pairs containing NaN are ignored.
    pub fn fill(&mut self, x: Float, y: Float) {
        if let (Some(bx), Some(by)) = (self.x_axis.bin(x), self.y_axis.bin(y)) {
            let idx = self.linear_index(bx, by);
            self.counts[idx] += 1;
        }
    }

    /// Content of a bin, including under/overflow
    pub fn count(&self, x_bin: usize, y_bin: usize) -> u64 {
        self.counts[self.linear_index(x_bin, y_bin)]
    }

    /// Number of value pairs that were counted, including under/overflow
    pub fn entries(&self) -> u64 {
        self.counts.iter().sum()
    }

    fn linear_index(&self, x_bin: usize, y_bin: usize) -> usize {
        y_bin * (self.x_axis.num_bins() + 2) + x_bin
    }
}

/// Histogram of either dimension
#[derive(Clone, Debug, PartialEq)]
pub enum Histogram {
    /// Distribution of one quantity
    OneD(Histogram1D),

    /// Correlation of two quantities
    TwoD(Histogram2D),
}
//
impl Histogram {
    /// Number of axes
    pub fn dimension(&self) -> usize {
        match self {
            Self::OneD(_) => 1,
            Self::TwoD(_) => 2,
        }
    }

    /// Number of counted entries
    pub fn entries(&self) -> u64 {
        match self {
            Self::OneD(h) => h.entries(),
            Self::TwoD(h) => h.entries(),
        }
    }

    /// Add the counts of a histogram with the same binning
    fn merge(&mut self, other: &Self) -> bool {
        match (self, other) {
            (Self::OneD(h1), Self::OneD(h2)) if h1.axis == h2.axis => {
                h1.counts.iter_mut().zip(&h2.counts).for_each(|(c1, c2)| *c1 += c2);
                true
            }
            (Self::TwoD(h1), Self::TwoD(h2)) if h1.x_axis == h2.x_axis && h1.y_axis == h2.y_axis => {
                h1.counts.iter_mut().zip(&h2.counts).for_each(|(c1, c2)| *c1 += c2);
                true
            }
            _ => false,
        }
    }
}

/// Named histograms, kept in booking order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistogramBook {
    histograms: IndexMap<String, Histogram>,
}
//
impl HistogramBook {
    /// Empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a 1-D histogram
    pub fn book_1d(&mut self, name: impl Into<String>, axis: Axis) {
        self.histograms
            .insert(name.into(), Histogram::OneD(Histogram1D::new(axis)));
    }

    /// Add (or replace) a 2-D histogram
    pub fn book_2d(&mut self, name: impl Into<String>, x_axis: Axis, y_axis: Axis) {
        self.histograms
            .insert(name.into(), Histogram::TwoD(Histogram2D::new(x_axis, y_axis)));
    }

    /// Add (or replace) a histogram of either dimension
    pub fn book(&mut self, name: impl Into<String>, binning: &Binning) {
        match &binning.y {
            None => self.book_1d(name, binning.x.clone()),
            Some(y) => self.book_2d(name, binning.x.clone(), y.clone()),
        }
    }

    /// Look up a histogram
    pub fn get(&self, name: &str) -> Option<&Histogram> {
        self.histograms.get(name)
    }

    /// Iterate over histograms in booking order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Histogram)> {
        self.histograms.iter().map(|(name, hist)| (name.as_str(), hist))
    }

    /// Fill a 1-D histogram
    pub fn fill(&mut self, name: &str, x: Float) -> AnalysisResult<()> {
        match self.lookup_mut(name)? {
            Histogram::OneD(h) => {
                h.fill(x);
                Ok(())
            }
            Histogram::TwoD(_) => Err(dimension_error(name, 1, 2)),
        }
    }

    /// Fill a 2-D histogram
    pub fn fill_2d(&mut self, name: &str, x: Float, y: Float) -> AnalysisResult<()> {
        match self.lookup_mut(name)? {
            Histogram::TwoD(h) => {
                h.fill(x, y);
                Ok(())
            }
            Histogram::OneD(_) => Err(dimension_error(name, 2, 1)),
        }
    }

    /// Add the content of another book with the same histograms
    pub fn merge(&mut self, other: &Self) -> AnalysisResult<()> {
        for (name, other_hist) in other.histograms.iter() {
            let hist = self.lookup_mut(name)?;
            if !hist.merge(other_hist) {
                return Err(AnalysisError::IncompatibleHistograms { name: name.clone() });
            }
        }
        Ok(())
    }

    fn lookup_mut(&mut self, name: &str) -> AnalysisResult<&mut Histogram> {
        self.histograms
            .get_mut(name)
            .ok_or_else(|| AnalysisError::UnknownHistogram { name: name.to_owned() })
    }
}

fn dimension_error(name: &str, expected: usize, actual: usize) -> AnalysisError {
    AnalysisError::HistogramDimension {
        name: name.to_owned(),
        expected,
        actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_binning() {
        let axis = Axis::new(4, 0., 2.);
        assert_eq!(axis.bin(-0.1), Some(0));
        assert_eq!(axis.bin(0.), Some(1));
        assert_eq!(axis.bin(0.49), Some(1));
        assert_eq!(axis.bin(0.5), Some(2));
        assert_eq!(axis.bin(1.99), Some(4));
        assert_eq!(axis.bin(2.), Some(5));
        assert_eq!(axis.bin(Float::INFINITY), Some(5));
        assert_eq!(axis.bin(Float::NAN), None);
        assert_eq!(axis.bin_low_edge(3), 1.);
    }

    #[test]
    fn fill_1d() {
        let mut hist = Histogram1D::new(Axis::new(10, 0., 10.));
        for x in [0.5, 0.7, 9.9, 12., -3., Float::NAN] {
            hist.fill(x);
        }
        assert_eq!(hist.count(1), 2);
        assert_eq!(hist.count(10), 1);
        assert_eq!(hist.count(0), 1);
        assert_eq!(hist.count(11), 1);
        assert_eq!(hist.entries(), 5);
    }

    #[test]
    fn fill_2d() {
        let mut hist = Histogram2D::new(Axis::new(2, 0., 1.), Axis::new(3, 0., 3.));
        hist.fill(0.7, 2.5);
        hist.fill(0.7, 2.5);
        hist.fill(0.2, 5.);
        hist.fill(Float::NAN, 1.);
        assert_eq!(hist.count(2, 3), 2);
        assert_eq!(hist.count(1, 4), 1);
        assert_eq!(hist.entries(), 3);
    }

    #[test]
    fn book_fills_by_name() {
        let mut book = HistogramBook::new();
        book.book_1d("a", Axis::new(2, 0., 2.));
        book.book_2d("b", Axis::new(2, 0., 2.), Axis::new(2, 0., 2.));
        book.fill("a", 1.5).unwrap();
        book.fill_2d("b", 0.5, 0.5).unwrap();
        assert!(matches!(book.fill("c", 1.), Err(AnalysisError::UnknownHistogram { .. })));
        assert!(matches!(
            book.fill("b", 1.),
            Err(AnalysisError::HistogramDimension { expected: 1, actual: 2, .. })
        ));
        assert!(matches!(
            book.fill_2d("a", 1., 1.),
            Err(AnalysisError::HistogramDimension { expected: 2, actual: 1, .. })
        ));
        assert_eq!(book.iter().map(|(name, _)| name).collect::<Vec<_>>(), vec!["a", "b"]);
        book.book("c", &Binning::two_d((3, 0., 1.), (4, -1., 1.)));
        assert_eq!(book.get("c").unwrap().dimension(), 2);
        assert_eq!(book.get("a").unwrap().entries(), 1);
    }

    #[test]
    fn merging_books() {
        let mut book1 = HistogramBook::new();
        book1.book_1d("a", Axis::new(2, 0., 2.));
        let mut book2 = book1.clone();
        book1.fill("a", 0.5).unwrap();
        book2.fill("a", 0.5).unwrap();
        book2.fill("a", 1.5).unwrap();
        book1.merge(&book2).unwrap();
        match book1.get("a").unwrap() {
            Histogram::OneD(h) => {
                assert_eq!(h.count(1), 2);
                assert_eq!(h.count(2), 1);
            }
            Histogram::TwoD(_) => panic!("Expected a 1-D histogram"),
        }

        let mut other = HistogramBook::new();
        other.book_1d("a", Axis::new(3, 0., 2.));
        assert!(matches!(
            book1.merge(&other),
            Err(AnalysisError::IncompatibleHistograms { .. })
        ));
    }
}
