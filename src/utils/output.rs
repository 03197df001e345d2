use std::fmt::Display;

/// Output format configuration
#[derive(Clone, Debug)]
pub struct OutputFormat {
    pub raw: bool,
}

impl OutputFormat {
    pub fn new(raw: bool) -> Self {
        Self { raw }
    }

    /// Print tabular data - either raw (tab-separated) or formatted (column-aligned)
    pub fn print_table<T>(&self, data: &[Vec<T>])
    where
        T: Display + AsRef<str>,
    {
        print!("{}", self.format_table(data));
    }

    /// Render tabular data, one line per row
    pub fn format_table<T>(&self, data: &[Vec<T>]) -> String
    where
        T: Display + AsRef<str>,
    {
        if data.is_empty() {
            return String::new();
        }

        if self.raw {
            data.iter()
                .map(|row| {
                    let line = row
                        .iter()
                        .map(|cell| cell.as_ref())
                        .collect::<Vec<_>>()
                        .join("\t");
                    format!("{line}\n")
                })
                .collect()
        } else {
            Self::format_aligned(data)
        }
    }

    /// Print key-value pairs
    pub fn print_key_value<K, V>(&self, pairs: &[(K, V)])
    where
        K: Display,
        V: Display,
    {
        let data: Vec<Vec<String>> = pairs
            .iter()
            .map(|(k, v)| vec![k.to_string(), v.to_string()])
            .collect();

        self.print_table(&data);
    }

    // Column-aligned like `column -t`
    fn format_aligned<T>(data: &[Vec<T>]) -> String
    where
        T: Display + AsRef<str>,
    {
        let num_cols = data.iter().map(Vec::len).max().unwrap_or(0);
        let mut col_widths = vec![0; num_cols];
        for row in data {
            for (i, cell) in row.iter().enumerate() {
                col_widths[i] = col_widths[i].max(cell.as_ref().len());
            }
        }

        let mut out = String::new();
        for row in data {
            let formatted_cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    if i == row.len() - 1 {
                        cell.to_string()
                    } else {
                        format!("{:<width$}", cell.as_ref(), width = col_widths[i])
                    }
                })
                .collect();
            out.push_str(&formatted_cells.join("  "));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_output() {
        let format = OutputFormat::new(true);
        let data = vec![
            vec!["secret/one", "v1", "one.pem"],
            vec!["cert/two", "abc", "two.pem"],
        ];
        assert_eq!(
            format.format_table(&data),
            "secret/one\tv1\tone.pem\ncert/two\tabc\ttwo.pem\n"
        );
    }

    #[test]
    fn test_formatted_output() {
        let format = OutputFormat::new(false);
        let data = vec![
            vec!["secret/one", "v1", "one.pem"],
            vec!["cert/two", "abcdef", "two.pem"],
        ];
        assert_eq!(
            format.format_table(&data),
            "secret/one  v1      one.pem\ncert/two    abcdef  two.pem\n"
        );
    }

    #[test]
    fn test_empty_table() {
        let data: Vec<Vec<String>> = Vec::new();
        assert_eq!(OutputFormat::new(false).format_table(&data), "");
    }
}
