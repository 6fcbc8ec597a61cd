//! 章节标识
//!
//! `{language, book, chapter}` 是所有内容来源之间的连接键。

use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::KeyError;
use crate::models::books::{self, Book};

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static GLUED_ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([1-3])([a-z])").unwrap());
static LANGUAGE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}(-[a-z0-9]{2,8})?$").unwrap());

/// 章节标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterKey {
    /// 语言代码（小写）
    pub language: String,
    /// 书卷标准标识
    pub book: String,
    /// 章节号（从 1 开始）
    pub chapter: u32,
}

impl ChapterKey {
    /// 创建并校验章节标识
    ///
    /// 书名可以是任意写法（`Gênesis`、`genesis`、`Salmos`、`I Samuel`），
    /// 统一映射到标准标识；章节号必须在该书的范围内。
    pub fn new(language: &str, book: &str, chapter: u32) -> Result<Self, KeyError> {
        let language = normalize_language(language)?;
        let info = canonical_book(book)?;

        if chapter == 0 || chapter > info.chapters {
            return Err(KeyError::ChapterOutOfRange {
                book: info.id.to_string(),
                chapter,
                max: info.chapters,
            });
        }

        Ok(Self {
            language,
            book: info.id.to_string(),
            chapter,
        })
    }

    /// 已经校验过的书卷和语言，直接拼装
    pub(crate) fn for_validated(language: &str, book: &'static Book, chapter: u32) -> Self {
        Self {
            language: language.to_string(),
            book: book.id.to_string(),
            chapter,
        }
    }

    /// 书卷信息
    pub fn book_info(&self) -> Option<&'static Book> {
        books::by_id(&self.book)
    }

    /// 葡萄牙语书名，找不到时退回标准标识
    pub fn display_name(&self) -> &str {
        self.book_info().map(|b| b.name_pt).unwrap_or(&self.book)
    }
}

impl Display for ChapterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.language, self.book, self.chapter)
    }
}

/// 规范化语言代码
///
/// 只接受语言代码的形式（`pt`、`en`、`pt-br`），`_` 视为 `-`。
/// 语言代码会拼进存储路径和 URL，其他字符一律拒绝。
pub fn normalize_language(language: &str) -> Result<String, KeyError> {
    let language = language.trim().to_lowercase().replace('_', "-");
    if language.is_empty() {
        return Err(KeyError::EmptyLanguage);
    }
    if !LANGUAGE_CODE.is_match(&language) {
        return Err(KeyError::InvalidLanguage(language));
    }
    Ok(language)
}

/// 规范化书名
///
/// 去掉变音符号、转小写、连续的非字母数字字符折叠为一个 `-`。
pub fn normalize_book(input: &str) -> String {
    let folded: String = input.to_lowercase().chars().map(fold_diacritic).collect();
    NON_ALNUM
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

/// 把任意写法的书名解析为目录中的书卷
pub fn canonical_book(input: &str) -> Result<&'static Book, KeyError> {
    let slug = normalize_book(input);
    let slug = expand_ordinal(&slug);
    books::by_slug(&slug).ok_or_else(|| KeyError::UnknownBook(input.to_string()))
}

/// `i-samuel` → `1-samuel`，`1samuel` → `1-samuel`
fn expand_ordinal(slug: &str) -> String {
    for (roman, arabic) in [("iii-", "3-"), ("ii-", "2-"), ("i-", "1-")] {
        if let Some(rest) = slug.strip_prefix(roman) {
            return format!("{}{}", arabic, rest);
        }
    }
    GLUED_ORDINAL.replace(slug, "$1-$2").into_owned()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_accents_and_collapses_separators() {
        assert_eq!(normalize_book("Gênesis"), "genesis");
        assert_eq!(normalize_book("  Cântico dos   Cânticos "), "cantico-dos-canticos");
        assert_eq!(normalize_book("1 João"), "1-joao");
        assert_eq!(normalize_book("Lamentações--de Jeremias!"), "lamentacoes-de-jeremias");
    }

    #[test]
    fn display_variants_map_to_same_key() {
        let a = ChapterKey::new("pt", "Gênesis", 1).unwrap();
        let b = ChapterKey::new("PT ", "genesis", 1).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "pt/genesis/1");

        let psalm = ChapterKey::new("pt", "Salmos", 23).unwrap();
        assert_eq!(psalm, ChapterKey::new("pt", "psalms", 23).unwrap());
    }

    #[test]
    fn ordinal_prefixes() {
        assert_eq!(canonical_book("I Samuel").unwrap().id, "1-samuel");
        assert_eq!(canonical_book("II Reis").unwrap().id, "2-kings");
        assert_eq!(canonical_book("3João").unwrap().id, "3-john");
        assert_eq!(canonical_book("1Coríntios").unwrap().id, "1-corinthians");
    }

    #[test]
    fn chapter_bounds_are_enforced() {
        assert_eq!(
            ChapterKey::new("pt", "obadias", 2),
            Err(KeyError::ChapterOutOfRange {
                book: "obadiah".into(),
                chapter: 2,
                max: 1
            })
        );
        assert!(matches!(
            ChapterKey::new("pt", "genesis", 0),
            Err(KeyError::ChapterOutOfRange { .. })
        ));
        assert!(ChapterKey::new("pt", "salmos", 150).is_ok());
    }

    #[test]
    fn rejects_unknown_book_and_empty_language() {
        assert_eq!(
            ChapterKey::new("pt", "Enoque", 1),
            Err(KeyError::UnknownBook("Enoque".into()))
        );
        assert_eq!(ChapterKey::new("  ", "genesis", 1), Err(KeyError::EmptyLanguage));
    }

    #[test]
    fn language_must_look_like_a_language_code() {
        assert_eq!(normalize_language(" PT_BR ").unwrap(), "pt-br");
        assert_eq!(normalize_language("la").unwrap(), "la");

        for bad in ["../escaped", "pt/../..", "en\\x", "portuguese", "p", ".."] {
            assert!(
                matches!(
                    ChapterKey::new(bad, "ruth", 1),
                    Err(KeyError::InvalidLanguage(_))
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn display_name_is_portuguese() {
        let key = ChapterKey::new("en", "exodus", 3).unwrap();
        assert_eq!(key.display_name(), "Êxodo");
    }
}
