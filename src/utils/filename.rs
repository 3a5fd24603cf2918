//! Filename handling for uploaded documents.

/// Maximum length of a sanitized filename.
const MAX_FILENAME_LEN: usize = 200;

/// Get the lowercase extension of a filename (text after the last dot).
///
/// Returns `None` when the name has no dot or nothing follows it.
pub fn file_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// Document type shown to clients: the uppercased extension of the original name.
pub fn document_type(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

/// Base letter of an accented Latin letter (`é` -> `e`).
///
/// Letters without a decomposition (`ß`, `æ`, `ø`) have none.
fn fold_accent(c: char) -> Option<char> {
    let base = match c {
        'À'..='Å' | 'Ā' | 'Ă' | 'Ą' => 'A',
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'Ç' | 'Ć' | 'Ĉ' | 'Ċ' | 'Č' => 'C',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'Ď' => 'D',
        'ď' => 'd',
        'È'..='Ë' | 'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => 'E',
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'Ĝ' | 'Ğ' | 'Ġ' | 'Ģ' => 'G',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'Ì'..='Ï' | 'Ĩ' | 'Ī' | 'Ĭ' | 'Į' | 'İ' => 'I',
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' => 'i',
        'Ñ' | 'Ń' | 'Ņ' | 'Ň' => 'N',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'Ò'..='Ö' | 'Ō' | 'Ŏ' | 'Ő' => 'O',
        'ò'..='ö' | 'ō' | 'ŏ' | 'ő' => 'o',
        'Ŕ' | 'Ř' => 'R',
        'ŕ' | 'ř' => 'r',
        'Ś' | 'Ş' | 'Š' => 'S',
        'ś' | 'ş' | 'š' => 's',
        'Ţ' | 'Ť' => 'T',
        'ţ' | 'ť' => 't',
        'Ù'..='Ü' | 'Ũ' | 'Ū' | 'Ŭ' | 'Ů' | 'Ű' | 'Ų' => 'U',
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'Ý' => 'Y',
        'ý' | 'ÿ' => 'y',
        'Ź' | 'Ż' | 'Ž' => 'Z',
        'ź' | 'ż' | 'ž' => 'z',
        _ => return None,
    };
    Some(base)
}

/// Sanitize a client-supplied filename for storage in the upload directory.
///
/// Drops any directory components (both `/` and `\`), turns whitespace into
/// underscores, folds accented Latin letters to their base letter, removes
/// every other character outside `[A-Za-z0-9._-]` and strips
/// leading dots and underscores so the result can never climb out of the
/// upload directory or become a hidden file. Returns an empty string when
/// nothing usable remains.
pub fn sanitize_filename(name: &str) -> String {
    let basename = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let sanitized: String = basename
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() => Some(c),
            '.' | '-' | '_' => Some(c),
            c if c.is_whitespace() => Some('_'),
            c => fold_accent(c),
        })
        .collect();

    let trimmed = sanitized.trim_start_matches(['.', '_']).trim_end_matches('_');
    if trimmed.chars().all(|c| c == '.') {
        return String::new();
    }

    if trimmed.len() > MAX_FILENAME_LEN {
        // Keep the extension when truncating.
        match trimmed.rsplit_once('.') {
            Some((stem, ext)) if ext.len() < 16 => {
                let keep = MAX_FILENAME_LEN - ext.len() - 1;
                format!("{}.{}", &stem[..keep.min(stem.len())], ext)
            }
            _ => trimmed[..MAX_FILENAME_LEN].to_string(),
        }
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("report.PDF").as_deref(), Some("pdf"));
        assert_eq!(file_extension("archive.tar.zip").as_deref(), Some("zip"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn test_document_type() {
        assert_eq!(document_type("scan.jpeg"), "JPEG");
        assert_eq!(document_type("Notes.Txt"), "TXT");
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\tax return.pdf"), "tax_return.pdf");
        assert_eq!(sanitize_filename("/tmp/.hidden.txt"), "hidden.txt");
    }

    #[test]
    fn test_sanitize_drops_unsafe_characters() {
        assert_eq!(sanitize_filename("invoice<2024>?.pdf"), "invoice2024.pdf");
        assert_eq!(sanitize_filename("straße.txt"), "strae.txt");
    }

    #[test]
    fn test_sanitize_folds_accents() {
        assert_eq!(sanitize_filename("résumé.docx"), "resume.docx");
        assert_eq!(sanitize_filename("Ñandú señor.pdf"), "Nandu_senor.pdf");
        assert_eq!(sanitize_filename("Łódź Žalgiris.txt"), "odz_Zalgiris.txt");
    }

    #[test]
    fn test_sanitize_empty_results() {
        assert_eq!(sanitize_filename(".."), "");
        assert_eq!(sanitize_filename("///"), "");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_sanitize_truncates_long_names() {
        let long = format!("{}.pdf", "a".repeat(400));
        let sanitized = sanitize_filename(&long);
        assert_eq!(sanitized.len(), MAX_FILENAME_LEN);
        assert!(sanitized.ends_with(".pdf"));
    }
}
