//! Output file naming for batches.

/// How output files are named: `{stem}{suffix}.{ext}`, with `_1`, `_2`, ... added on collision.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NamingPolicy {
    pub suffix: String,
}
impl Default for NamingPolicy {
    fn default() -> Self {
        Self {
            suffix: "_resized".into(),
        }
    }
}
impl NamingPolicy {
    /// The name for `stem`, with a collision counter if `n > 0`.
    #[must_use]
    pub fn file_name(&self, stem: &str, n: usize, extension: &str) -> String {
        if n == 0 {
            format!("{stem}{}.{extension}", self.suffix)
        } else {
            format!("{stem}{}_{n}.{extension}", self.suffix)
        }
    }
    /// Name every `(stem, extension)` in order, so that no two are equal.
    ///
    /// Comparison ignores ASCII case, as many filesystems do. Earlier entries always win the
    /// uncounted name, so the result depends only on the input order.
    #[must_use]
    pub fn resolve<'a>(&self, requests: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<String> {
        let mut claimed = hashbrown::HashSet::new();
        requests
            .into_iter()
            .map(|(stem, extension)| {
                let mut n = 0;
                loop {
                    let name = self.file_name(stem, n, extension);
                    if claimed.insert(name.to_ascii_lowercase()) {
                        break name;
                    }
                    n += 1;
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::NamingPolicy;
    #[test]
    fn collisions_are_counted_in_order() {
        let policy = NamingPolicy::default();
        let names = policy.resolve([("x", "png"), ("y", "png"), ("x", "png"), ("X", "png"), ("x", "jpg")]);
        assert_eq!(
            names,
            [
                "x_resized.png",
                "y_resized.png",
                "x_resized_1.png",
                "X_resized_2.png",
                "x_resized.jpg"
            ]
        );
    }
    #[test]
    fn literal_counter_names_do_not_clash() {
        let policy = NamingPolicy {
            suffix: String::new(),
        };
        let names = policy.resolve([("a_1", "png"), ("a", "png"), ("a", "png")]);
        assert_eq!(names, ["a_1.png", "a.png", "a_2.png"]);
    }
}
