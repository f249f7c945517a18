/// One row of the dataset: column names paired with their values, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    #[cfg(test)]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    #[cfg(test)]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }

    /// Consume the record, returning its values ordered like `columns`.
    ///
    /// Returns None if any column is missing or the record carries extra ones.
    pub fn into_values(self, columns: &[String]) -> Option<Vec<String>> {
        if self.fields.len() != columns.len() {
            return None;
        }

        // Fast path: sources almost always yield fields in header order
        if self.fields.iter().zip(columns).all(|((k, _), c)| k == c) {
            return Some(self.fields.into_iter().map(|(_, v)| v).collect());
        }

        let mut fields = self.fields;
        columns
            .iter()
            .map(|c| {
                let idx = fields.iter().position(|(k, _)| k == c)?;
                Some(std::mem::take(&mut fields[idx].1))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_get_by_column() {
        let r = Record::from_pairs([("sku", "POV157"), ("price", "80.90")]);
        assert_eq!(r.get("price"), Some("80.90"));
        assert_eq!(r.get("name"), None);
        assert_eq!(r.columns().collect::<Vec<_>>(), vec!["sku", "price"]);
    }

    #[test]
    fn test_into_values_reorders() {
        let r = Record::from_pairs([("price", "19.90"), ("sku", "SAV42")]);
        assert_eq!(
            r.into_values(&cols(&["sku", "price"])),
            Some(vec!["SAV42".to_string(), "19.90".to_string()])
        );
    }

    #[test]
    fn test_into_values_rejects_other_columns() {
        let r = Record::from_pairs([("sku", "SAV42"), ("qty", "3")]);
        assert_eq!(r.into_values(&cols(&["sku", "price"])), None);

        let r = Record::from_pairs([("sku", "SAV42")]);
        assert_eq!(r.into_values(&cols(&["sku", "price"])), None);
    }
}
