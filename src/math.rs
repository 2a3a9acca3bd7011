pub trait IteratorAvg<T>: Iterator<Item = T> {
    fn avg(self) -> Option<T>;
    fn avg_with_std(self) -> Option<(T, T)>;
    fn std(self) -> Option<T>;
}

macro_rules! impl_avg {
    ($($a:ident)*) => ($(
        impl<I> IteratorAvg<$a> for I
        where
            I: Iterator<Item = $a>,
        {
            fn avg(self) -> Option<$a> {
                let (sum, cnt) = self.fold((0.0 as $a, 0usize), |(sum, cnt), x| (sum + x, cnt + 1));
                (cnt > 0).then(|| sum / cnt as $a)
            }

            /// Population standard deviation.
            fn avg_with_std(self) -> Option<($a, $a)> {
                let values = self.collect::<Vec<_>>();
                let avg = values.iter().copied().avg()?;
                let var = values.iter().map(|x| (x - avg).powi(2)).avg()?;
                Some((avg, var.sqrt()))
            }

            fn std(self) -> Option<$a> {
                self.avg_with_std().map(|(_, std)| std)
            }
        }
    )*)
}

impl_avg! { f32 f64 }

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::{assert_f64_near, assert_float_absolute_eq};

    #[test]
    fn test_avg_empty() {
        let data: Vec<f64> = vec![];
        assert!(data.iter().copied().avg().is_none());
        assert!(data.iter().copied().std().is_none());
    }

    #[test]
    fn test_avg_thermo_column() {
        let temp = [300.0, 301.5, 299.0, 302.5, 297.0];
        assert_f64_near!(temp.iter().copied().avg().unwrap(), 300.0);
        let (avg, std) = temp.iter().copied().avg_with_std().unwrap();
        assert_f64_near!(avg, 300.0);
        assert_float_absolute_eq!(std, 1.9235384061671346, 1e-12);
    }

    #[test]
    fn test_std_constant() {
        let press = [-1.5f32; 4];
        assert_eq!(press.iter().copied().std(), Some(0.0));
    }
}
