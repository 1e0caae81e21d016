/// Quartile summary of a dataset.
///
/// Stores the first quartile, median, and third quartile of an `f32`
/// dataset. Quartiles are computed with the median-of-halves method: the
/// median averages the two middle elements for even-length data, and the
/// first/third quartiles are the medians of the lower/upper halves
/// (excluding the middle element for odd-length data).
///
/// # Examples
///
/// ```
/// use surrofit_stats::quartiles::Quartiles;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
/// let quartiles = Quartiles::new(values).unwrap();
/// assert_eq!(quartiles.first, 2.5);
/// assert_eq!(quartiles.median, 4.5);
/// assert_eq!(quartiles.third, 6.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    /// The first quartile (25th percentile) of the dataset.
    pub first: f32,
    /// The median (50th percentile) of the dataset.
    pub median: f32,
    /// The third quartile (75th percentile) of the dataset.
    pub third: f32,
}

impl Quartiles {
    /// Computes quartiles from unsorted values.
    ///
    /// The values are collected and sorted internally before computation.
    ///
    /// # Arguments
    ///
    /// * `values` - An iterator over `f32` values
    ///
    /// # Returns
    ///
    /// * `Some(Quartiles)` - if the dataset contains at least one value
    /// * `None` - if the dataset is empty
    ///
    /// # Examples
    ///
    /// ```
    /// use surrofit_stats::quartiles::Quartiles;
    ///
    /// let quartiles = Quartiles::new([5.0, 1.0, 3.0]).unwrap();
    /// assert_eq!(quartiles.median, 3.0);
    /// assert!(Quartiles::new([]).is_none());
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f32>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f32::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes quartiles from pre-sorted values.
    ///
    /// Use this when the data is already sorted to avoid a redundant sort.
    ///
    /// # Arguments
    ///
    /// * `sorted_values` - Values sorted in ascending order
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use surrofit_stats::quartiles::Quartiles;
    ///
    /// let values = [1.0, 2.0, 3.0, 4.0, 5.0];
    /// let quartiles = Quartiles::from_sorted(&values).unwrap();
    /// assert_eq!(quartiles.first, 1.5);
    /// assert_eq!(quartiles.median, 3.0);
    /// assert_eq!(quartiles.third, 4.5);
    /// ```
    #[must_use]
    pub fn from_sorted(sorted_values: &[f32]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        if sorted_values.is_empty() {
            return None;
        }
        let n = sorted_values.len();
        if n == 1 {
            let value = sorted_values[0];
            return Some(Self {
                first: value,
                median: value,
                third: value,
            });
        }

        let median = median_of_sorted(sorted_values);
        // lower/upper halves exclude the middle element when n is odd
        let first = median_of_sorted(&sorted_values[..n / 2]);
        let third = median_of_sorted(&sorted_values[n - n / 2..]);

        Some(Self {
            first,
            median,
            third,
        })
    }
}

/// Computes the median of non-empty sorted data, averaging the two middle
/// elements for even lengths.
fn median_of_sorted(sorted_values: &[f32]) -> f32 {
    let n = sorted_values.len();
    if n % 2 == 0 {
        (sorted_values[n / 2 - 1] + sorted_values[n / 2]) / 2.0
    } else {
        sorted_values[n / 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_values() {
        let quartiles = Quartiles::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
        assert_eq!(quartiles.first, 2.5);
        assert_eq!(quartiles.median, 4.5);
        assert_eq!(quartiles.third, 6.5);
    }

    #[test]
    fn unsorted_input_is_sorted_internally() {
        let quartiles = Quartiles::new([8.0, 1.0, 6.0, 3.0, 4.0, 7.0, 2.0, 5.0]).unwrap();
        assert_eq!(quartiles.first, 2.5);
        assert_eq!(quartiles.median, 4.5);
        assert_eq!(quartiles.third, 6.5);
    }

    #[test]
    fn odd_length_excludes_middle_from_halves() {
        let quartiles = Quartiles::new([1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(quartiles.first, 1.5);
        assert_eq!(quartiles.median, 3.0);
        assert_eq!(quartiles.third, 4.5);
    }

    #[test]
    fn tiny_datasets() {
        let single = Quartiles::new([7.0]).unwrap();
        assert_eq!(single.first, 7.0);
        assert_eq!(single.median, 7.0);
        assert_eq!(single.third, 7.0);

        let pair = Quartiles::new([2.0, 4.0]).unwrap();
        assert_eq!(pair.first, 2.0);
        assert_eq!(pair.median, 3.0);
        assert_eq!(pair.third, 4.0);
    }

    #[test]
    fn empty_is_none() {
        assert!(Quartiles::new([]).is_none());
    }

    #[test]
    #[should_panic(expected = "sorted in ascending order")]
    fn from_sorted_rejects_unsorted() {
        let _ = Quartiles::from_sorted(&[3.0, 1.0, 2.0]);
    }
}
