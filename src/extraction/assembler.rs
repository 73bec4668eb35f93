//! Pairs name and email fragments into candidate records.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::RawLine;
use crate::classify::{NoiseClassifier, NoiseRule};
use crate::config::TableField;
use crate::models::{CandidateRecord, SourceStrategy};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
        .expect("email pattern should compile")
});

static SITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)[^\s,;|]+").expect("site pattern should compile")
});

/// Registration number glued to the end of a name ("SILVA 1234", "SILVA 12/3").
static TRAILING_REGISTRATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\d+[/\-]?\d*\s*$").expect("registration pattern should compile")
});

static TRAILING_JUNK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d\s\-./,;:|]+$").expect("trailing junk pattern should compile"));

static LEADING_JUNK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[_\W]+").expect("leading junk pattern should compile"));

/// How lines of one extraction pass turn into records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyMode {
    /// Only lines carrying an email produce records.
    EmailAnchored,
    /// As `EmailAnchored`, but a name-like line right before an email line
    /// is carried into it. OCR tends to wrap long names.
    EmailAnchoredWithContinuation,
    /// Every accepted line is a name-only record.
    NameColumn,
}

/// Builds `CandidateRecord`s from the text of one page.
#[derive(Debug, Clone)]
pub struct Assembler {
    classifier: Arc<NoiseClassifier>,
    mode: AssemblyMode,
}

impl Assembler {
    pub fn new(classifier: Arc<NoiseClassifier>, mode: AssemblyMode) -> Self {
        Self { classifier, mode }
    }

    pub fn mode(&self) -> AssemblyMode {
        self.mode
    }

    /// Assemble records from page text, in line order.
    pub fn assemble(&self, text: &str, page: u32, strategy: SourceStrategy) -> Vec<CandidateRecord> {
        let mut records = Vec::new();
        let mut pending: Option<String> = None;

        for raw in RawLine::split(text, page, strategy) {
            let line = raw.text.trim();
            if let Some(rule) = self.classifier.layout_noise(line) {
                if rule != NoiseRule::Empty {
                    tracing::debug!("p{} {}: dropped {} line {:?}", raw.page, raw.strategy, rule, line);
                }
                pending = None;
                continue;
            }

            if self.mode == AssemblyMode::NameColumn {
                if let Some(record) = self
                    .accept_name(line)
                    .and_then(|name| CandidateRecord::new(name, raw.page, raw.strategy))
                {
                    records.push(record);
                }
                continue;
            }

            match EMAIL.find(line) {
                Some(m) => {
                    let carried = pending.take();
                    if let Some(record) = self.email_line(line, m, carried, &raw) {
                        records.push(record);
                    }
                }
                None => {
                    let cleaned = clean_name(line);
                    let class = self.classifier.classify(&cleaned);
                    pending = (self.mode == AssemblyMode::EmailAnchoredWithContinuation
                        && !cleaned.is_empty()
                        && class.is_candidate())
                    .then_some(cleaned);
                    if let Some(rule) = class.rule() {
                        tracing::debug!("p{} {}: dropped {} line {:?}", raw.page, raw.strategy, rule, line);
                    }
                }
            }
        }

        records
    }

    fn email_line(
        &self,
        line: &str,
        m: regex::Match<'_>,
        carried: Option<String>,
        raw: &RawLine<'_>,
    ) -> Option<CandidateRecord> {
        let email = m.as_str().to_lowercase();
        let fragment = clean_name(&line[..m.start()]);
        let fragment_ok = !fragment.is_empty() && self.classifier.classify(&fragment).is_candidate();

        let name = match (carried, fragment_ok) {
            (Some(prev), true) => Some(format!("{} {}", prev, fragment)),
            (Some(prev), false) => Some(prev),
            (None, true) => Some(fragment),
            (None, false) => None,
        };
        let name = name
            .map(|n| fix_case(&n))
            .filter(|n| n.chars().count() >= self.classifier.min_length())
            .or_else(|| name_from_email(&email));

        let Some(name) = name else {
            tracing::debug!("p{} {}: no name for {}", raw.page, raw.strategy, email);
            return None;
        };

        let site = SITE
            .find(&line[m.end()..])
            .map(|s| s.as_str().trim_end_matches(['.', ')']).to_string());

        CandidateRecord::new(name, raw.page, raw.strategy)
            .map(|r| r.with_email(Some(email)).with_site(site))
    }

    /// Clean a name cell and keep it if it reads like a name.
    pub fn accept_name(&self, raw: &str) -> Option<String> {
        if self.classifier.layout_noise(raw).is_some() {
            return None;
        }
        let cleaned = clean_name(raw);
        if cleaned.is_empty() || self.classifier.classify(&cleaned).is_noise() {
            return None;
        }
        Some(fix_case(&cleaned))
    }

    /// Pair a name column with an email column recognized separately.
    ///
    /// The i-th name takes the i-th email; when the counts differ, emails are
    /// reused round-robin. With no emails the names stand alone.
    pub fn pair_columns(
        &self,
        names_text: &str,
        emails_text: &str,
        page: u32,
        strategy: SourceStrategy,
    ) -> Vec<CandidateRecord> {
        let names: Vec<String> = names_text.lines().filter_map(|l| self.accept_name(l)).collect();
        let emails = find_emails(emails_text);

        if names.len() != emails.len() && !emails.is_empty() {
            tracing::debug!(
                "p{} {}: {} names vs {} emails, pairing round-robin",
                page,
                strategy,
                names.len(),
                emails.len()
            );
        }

        names
            .into_iter()
            .enumerate()
            .filter_map(|(i, name)| {
                let email = (!emails.is_empty()).then(|| emails[i % emails.len()].clone());
                CandidateRecord::new(name, page, strategy).map(|r| r.with_email(email))
            })
            .collect()
    }

    /// Transpose per-band column text into rows, one record per named row.
    pub fn assemble_rows(
        &self,
        bands: &[(TableField, String)],
        page: u32,
        strategy: SourceStrategy,
    ) -> Vec<CandidateRecord> {
        let columns: Vec<(TableField, Vec<&str>)> = bands
            .iter()
            .map(|(field, text)| (*field, text.lines().collect()))
            .collect();
        let row_count = columns.iter().map(|(_, lines)| lines.len()).max().unwrap_or(0);

        let cell = |field: TableField, row: usize| table_cell(&columns, field, row);
        let numeric = |c: &&str| c.chars().any(|ch| ch.is_ascii_digit());

        (0..row_count)
            .filter_map(|row| {
                let name = self.accept_name(cell(TableField::Name, row)?)?;
                let email = cell(TableField::Email, row)
                    .and_then(|c| EMAIL.find(c))
                    .map(|m| m.as_str().to_lowercase());
                let phone = cell(TableField::Phone, row).filter(numeric).map(str::to_string);
                let registration = cell(TableField::Registration, row)
                    .filter(numeric)
                    .map(str::to_string);
                CandidateRecord::new(name, page, strategy).map(|r| {
                    r.with_email(email)
                        .with_phone(phone)
                        .with_registration(registration)
                })
            })
            .collect()
    }
}

fn table_cell<'a>(
    columns: &[(TableField, Vec<&'a str>)],
    field: TableField,
    row: usize,
) -> Option<&'a str> {
    columns
        .iter()
        .find(|(f, _)| *f == field)
        .and_then(|(_, lines)| lines.get(row).copied())
        .map(str::trim)
        .filter(|c| !c.is_empty())
}

/// All email addresses in a block of text, lower-cased, in order.
pub fn find_emails(text: &str) -> Vec<String> {
    EMAIL
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Strip registration numbers, trailing junk and leading punctuation from a
/// name fragment, collapsing whitespace.
pub fn clean_name(fragment: &str) -> String {
    let name = TRAILING_REGISTRATION.replace(fragment.trim(), "");
    let name = TRAILING_JUNK.replace(&name, "");
    let name = LEADING_JUNK.replace(&name, "");
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title-case names written in a single case; keep mixed case as written.
pub fn fix_case(name: &str) -> String {
    let has_lower = name.chars().any(char::is_lowercase);
    let has_upper = name.chars().any(char::is_uppercase);
    if has_lower && has_upper {
        return name.to_string();
    }
    title_case(name)
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

/// Build a display name from an email local part: `joao.silva_01@x` gives "Joao Silva".
pub fn name_from_email(email: &str) -> Option<String> {
    let local = email.split('@').next()?;
    let tokens: Vec<String> = local
        .split(['.', '_', '-', '+'])
        .map(|t| t.chars().filter(|c| !c.is_ascii_digit()).collect::<String>())
        .filter(|t| !t.is_empty())
        .map(|t| title_case(&t.to_lowercase()))
        .collect();
    (!tokens.is_empty()).then(|| tokens.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoiseConfig;

    fn assembler(mode: AssemblyMode) -> Assembler {
        let classifier = NoiseClassifier::new(&NoiseConfig::default()).unwrap();
        Assembler::new(Arc::new(classifier), mode)
    }

    #[test]
    fn test_registry_line_with_registration_number() {
        let records = assembler(AssemblyMode::EmailAnchored).assemble(
            "JOAO DA SILVA 1234 joao@meudominio.com.br",
            1,
            SourceStrategy::DirectText,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "Joao Da Silva");
        assert_eq!(records[0].email(), Some("joao@meudominio.com.br"));
        assert_eq!(records[0].page(), 1);
    }

    #[test]
    fn test_lines_without_email_are_dropped_from_text_layer() {
        let text = "NOME DO LEILOEIRO\nANA LIMA\nRUA DAS FLORES, 123\nBruno Reis  bruno@reis.com.br";
        let records = assembler(AssemblyMode::EmailAnchored).assemble(text, 2, SourceStrategy::DirectText);
        assert_eq!(records.len(), 1);
        // Mixed case survives untouched
        assert_eq!(records[0].name(), "Bruno Reis");
    }

    #[test]
    fn test_site_after_email() {
        let records = assembler(AssemblyMode::EmailAnchored).assemble(
            "CARLA MOTA carla@motaleiloes.com.br www.motaleiloes.com.br.",
            1,
            SourceStrategy::DirectText,
        );
        assert_eq!(records[0].site(), Some("www.motaleiloes.com.br"));
    }

    #[test]
    fn test_noisy_fragment_falls_back_to_email_local_part() {
        let records = assembler(AssemblyMode::EmailAnchored).assemble(
            "Rua A, 10-20 maria_souza.99@leiloes.com",
            1,
            SourceStrategy::DirectText,
        );
        assert_eq!(records[0].name(), "Maria Souza");
    }

    #[test]
    fn test_continuation_joins_wrapped_name() {
        let text = "MARIA APARECIDA\nDOS SANTOS maria@santosleiloes.com.br";
        let records = assembler(AssemblyMode::EmailAnchoredWithContinuation).assemble(
            text,
            3,
            SourceStrategy::Ocr,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "Maria Aparecida Dos Santos");
    }

    #[test]
    fn test_continuation_used_alone_for_short_fragment() {
        let text = "PEDRO ALVES\n| pedro@alves.com.br";
        let records = assembler(AssemblyMode::EmailAnchoredWithContinuation).assemble(
            text,
            1,
            SourceStrategy::Ocr,
        );
        assert_eq!(records[0].name(), "Pedro Alves");
    }

    #[test]
    fn test_noise_line_breaks_continuation() {
        let text = "PEDRO ALVES\nTelefone\nx pedro@alves.com.br";
        let records = assembler(AssemblyMode::EmailAnchoredWithContinuation).assemble(
            text,
            1,
            SourceStrategy::Ocr,
        );
        assert_eq!(records[0].name(), "Pedro");
    }

    #[test]
    fn test_name_column_mode() {
        let text = "NOME\nANA LIMA\nRUA X 10-20\nbruno reis\n";
        let records = assembler(AssemblyMode::NameColumn).assemble(text, 1, SourceStrategy::OcrCrop);
        let names: Vec<_> = records.iter().map(|r| r.name()).collect();
        assert_eq!(names, ["Ana Lima", "Bruno Reis"]);
        assert!(records.iter().all(|r| r.email().is_none()));
    }

    #[test]
    fn test_pair_columns_round_robin() {
        let a = assembler(AssemblyMode::NameColumn);
        let records = a.pair_columns(
            "ANA LIMA\nBRUNO REIS\nCARLA MOTA",
            "ana@lima.com.br\nbruno@reis.com.br",
            4,
            SourceStrategy::ColumnSplit,
        );
        let emails: Vec<_> = records.iter().map(|r| r.email().unwrap()).collect();
        assert_eq!(emails, ["ana@lima.com.br", "bruno@reis.com.br", "ana@lima.com.br"]);
    }

    #[test]
    fn test_pair_columns_without_emails() {
        let a = assembler(AssemblyMode::NameColumn);
        let records = a.pair_columns("ANA LIMA", "", 1, SourceStrategy::ColumnSplit);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].email(), None);
    }

    #[test]
    fn test_assemble_rows_transposes_bands() {
        let a = assembler(AssemblyMode::NameColumn);
        let bands = vec![
            (TableField::Name, "NOME\nANA LIMA\nBRUNO REIS".to_string()),
            (TableField::Registration, "MATRÍCULA\n101\n".to_string()),
            (TableField::Phone, "TELEFONE\n(11) 5555-0101\n(11) 5555-0202".to_string()),
            (TableField::Email, "E-MAIL\nana@lima.com.br\n".to_string()),
        ];
        let records = a.assemble_rows(&bands, 1, SourceStrategy::FixedColumns);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name(), "Ana Lima");
        assert_eq!(records[0].registration(), Some("101"));
        assert_eq!(records[0].email(), Some("ana@lima.com.br"));
        assert_eq!(records[1].phone(), Some("(11) 5555-0202"));
        assert_eq!(records[1].email(), None);
        assert_eq!(records[1].registration(), None);
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  - JOAO DA SILVA 1234/5 "), "JOAO DA SILVA");
        assert_eq!(clean_name("ANA LIMA, 12 -"), "ANA LIMA");
        assert_eq!(clean_name("***"), "");
    }

    #[test]
    fn test_fix_case() {
        assert_eq!(fix_case("JOAO DA SILVA"), "Joao Da Silva");
        assert_eq!(fix_case("joão d'ávila"), "João D'Ávila");
        assert_eq!(fix_case("McDonald Leilões"), "McDonald Leilões");
    }

    #[test]
    fn test_name_from_email() {
        assert_eq!(name_from_email("joao.silva@x.com").as_deref(), Some("Joao Silva"));
        assert_eq!(name_from_email("CONTATO2@x.com").as_deref(), Some("Contato"));
        assert_eq!(name_from_email("123@x.com"), None);
    }
}
