/// Error raised while tokenizing, parsing or compiling an expression.
///
/// The rendered message carries the position and the expression text:
///
/// ```text
/// Unexpected end of expression around position 6 for expression `node.`.
/// ```
///
/// Errors about unknown names may end with a suggestion:
///
/// ```text
/// Variable "fo" is not valid around position 1 for expression `fo`. Did you mean "foo"?
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{rendered}")]
pub struct SyntaxError {
    rendered: String,
    cursor: usize,
    expression: String,
}

impl SyntaxError {
    pub fn new(message: impl AsRef<str>, cursor: usize, expression: &str) -> Self {
        let mut rendered = format!(
            "{} around position {}",
            message.as_ref().trim_end_matches('.'),
            cursor
        );
        if !expression.is_empty() {
            rendered.push_str(&format!(" for expression `{expression}`"));
        }
        rendered.push('.');

        SyntaxError {
            rendered,
            cursor,
            expression: expression.to_string(),
        }
    }

    /// Same as [`SyntaxError::new`], appending `Did you mean "<x>"?` when one of
    /// `candidates` is within edit distance 2 of `subject`.
    pub fn with_suggestion<'c, I>(
        message: impl AsRef<str>,
        cursor: usize,
        expression: &str,
        subject: &str,
        candidates: I,
    ) -> Self
    where
        I: IntoIterator<Item = &'c str>,
    {
        let mut error = SyntaxError::new(message, cursor, expression);
        if let Some(guess) = suggest(subject, candidates) {
            error.rendered.push_str(&format!(" Did you mean \"{guess}\"?"));
        }
        error
    }

    /// The full rendered message.
    pub fn message(&self) -> &str {
        &self.rendered
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}

/// Closest candidate to `subject`, if its edit distance is below 3.
///
/// Ties keep the first candidate seen.
pub fn suggest<'c, I>(subject: &str, candidates: I) -> Option<&'c str>
where
    I: IntoIterator<Item = &'c str>,
{
    let mut best: Option<(&'c str, usize)> = None;
    for candidate in candidates {
        let distance = edit_distance(subject, candidate);
        if best.is_none_or(|(_, min)| distance < min) {
            best = Some((candidate, distance));
        }
    }
    best.filter(|(_, distance)| *distance < 3).map(|(candidate, _)| candidate)
}

/// Levenshtein distance between two strings, counted in characters.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());
    let mut dp = vec![vec![0usize; n + 1]; m + 1];

    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=n {
        dp[0][j] = j;
    }
    for i in 1..=m {
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[m][n]
}
