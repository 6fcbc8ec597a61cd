//! 书卷目录
//!
//! 66 卷书的标准标识、葡萄牙语名称和章节数。
//! 标准标识使用英文 slug（`genesis`、`1-samuel`、`song-of-solomon`），
//! 葡萄牙语和英语的常见写法通过别名表映射到标准标识。

use phf::phf_map;

/// 书卷信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Book {
    /// 标准标识
    pub id: &'static str,
    /// 葡萄牙语名称
    pub name_pt: &'static str,
    /// 章节数
    pub chapters: u32,
}

/// 标准顺序的全部书卷
#[rustfmt::skip]
pub static BOOKS: [Book; 66] = [
    Book { id: "genesis", name_pt: "Gênesis", chapters: 50 },
    Book { id: "exodus", name_pt: "Êxodo", chapters: 40 },
    Book { id: "leviticus", name_pt: "Levítico", chapters: 27 },
    Book { id: "numbers", name_pt: "Números", chapters: 36 },
    Book { id: "deuteronomy", name_pt: "Deuteronômio", chapters: 34 },
    Book { id: "joshua", name_pt: "Josué", chapters: 24 },
    Book { id: "judges", name_pt: "Juízes", chapters: 21 },
    Book { id: "ruth", name_pt: "Rute", chapters: 4 },
    Book { id: "1-samuel", name_pt: "1 Samuel", chapters: 31 },
    Book { id: "2-samuel", name_pt: "2 Samuel", chapters: 24 },
    Book { id: "1-kings", name_pt: "1 Reis", chapters: 22 },
    Book { id: "2-kings", name_pt: "2 Reis", chapters: 25 },
    Book { id: "1-chronicles", name_pt: "1 Crônicas", chapters: 29 },
    Book { id: "2-chronicles", name_pt: "2 Crônicas", chapters: 36 },
    Book { id: "ezra", name_pt: "Esdras", chapters: 10 },
    Book { id: "nehemiah", name_pt: "Neemias", chapters: 13 },
    Book { id: "esther", name_pt: "Ester", chapters: 10 },
    Book { id: "job", name_pt: "Jó", chapters: 42 },
    Book { id: "psalms", name_pt: "Salmos", chapters: 150 },
    Book { id: "proverbs", name_pt: "Provérbios", chapters: 31 },
    Book { id: "ecclesiastes", name_pt: "Eclesiastes", chapters: 12 },
    Book { id: "song-of-solomon", name_pt: "Cânticos", chapters: 8 },
    Book { id: "isaiah", name_pt: "Isaías", chapters: 66 },
    Book { id: "jeremiah", name_pt: "Jeremias", chapters: 52 },
    Book { id: "lamentations", name_pt: "Lamentações", chapters: 5 },
    Book { id: "ezekiel", name_pt: "Ezequiel", chapters: 48 },
    Book { id: "daniel", name_pt: "Daniel", chapters: 12 },
    Book { id: "hosea", name_pt: "Oseias", chapters: 14 },
    Book { id: "joel", name_pt: "Joel", chapters: 3 },
    Book { id: "amos", name_pt: "Amós", chapters: 9 },
    Book { id: "obadiah", name_pt: "Obadias", chapters: 1 },
    Book { id: "jonah", name_pt: "Jonas", chapters: 4 },
    Book { id: "micah", name_pt: "Miqueias", chapters: 7 },
    Book { id: "nahum", name_pt: "Naum", chapters: 3 },
    Book { id: "habakkuk", name_pt: "Habacuque", chapters: 3 },
    Book { id: "zephaniah", name_pt: "Sofonias", chapters: 3 },
    Book { id: "haggai", name_pt: "Ageu", chapters: 2 },
    Book { id: "zechariah", name_pt: "Zacarias", chapters: 14 },
    Book { id: "malachi", name_pt: "Malaquias", chapters: 4 },
    Book { id: "matthew", name_pt: "Mateus", chapters: 28 },
    Book { id: "mark", name_pt: "Marcos", chapters: 16 },
    Book { id: "luke", name_pt: "Lucas", chapters: 24 },
    Book { id: "john", name_pt: "João", chapters: 21 },
    Book { id: "acts", name_pt: "Atos", chapters: 28 },
    Book { id: "romans", name_pt: "Romanos", chapters: 16 },
    Book { id: "1-corinthians", name_pt: "1 Coríntios", chapters: 16 },
    Book { id: "2-corinthians", name_pt: "2 Coríntios", chapters: 13 },
    Book { id: "galatians", name_pt: "Gálatas", chapters: 6 },
    Book { id: "ephesians", name_pt: "Efésios", chapters: 6 },
    Book { id: "philippians", name_pt: "Filipenses", chapters: 4 },
    Book { id: "colossians", name_pt: "Colossenses", chapters: 4 },
    Book { id: "1-thessalonians", name_pt: "1 Tessalonicenses", chapters: 5 },
    Book { id: "2-thessalonians", name_pt: "2 Tessalonicenses", chapters: 3 },
    Book { id: "1-timothy", name_pt: "1 Timóteo", chapters: 6 },
    Book { id: "2-timothy", name_pt: "2 Timóteo", chapters: 4 },
    Book { id: "titus", name_pt: "Tito", chapters: 3 },
    Book { id: "philemon", name_pt: "Filemom", chapters: 1 },
    Book { id: "hebrews", name_pt: "Hebreus", chapters: 13 },
    Book { id: "james", name_pt: "Tiago", chapters: 5 },
    Book { id: "1-peter", name_pt: "1 Pedro", chapters: 5 },
    Book { id: "2-peter", name_pt: "2 Pedro", chapters: 3 },
    Book { id: "1-john", name_pt: "1 João", chapters: 5 },
    Book { id: "2-john", name_pt: "2 João", chapters: 1 },
    Book { id: "3-john", name_pt: "3 João", chapters: 1 },
    Book { id: "jude", name_pt: "Judas", chapters: 1 },
    Book { id: "revelation", name_pt: "Apocalipse", chapters: 22 },
];

/// 标准标识 → `BOOKS` 下标
static BOOK_INDEX: phf::Map<&'static str, usize> = phf_map! {
    "genesis" => 0, "exodus" => 1, "leviticus" => 2, "numbers" => 3,
    "deuteronomy" => 4, "joshua" => 5, "judges" => 6, "ruth" => 7,
    "1-samuel" => 8, "2-samuel" => 9, "1-kings" => 10, "2-kings" => 11,
    "1-chronicles" => 12, "2-chronicles" => 13, "ezra" => 14, "nehemiah" => 15,
    "esther" => 16, "job" => 17, "psalms" => 18, "proverbs" => 19,
    "ecclesiastes" => 20, "song-of-solomon" => 21, "isaiah" => 22, "jeremiah" => 23,
    "lamentations" => 24, "ezekiel" => 25, "daniel" => 26, "hosea" => 27,
    "joel" => 28, "amos" => 29, "obadiah" => 30, "jonah" => 31,
    "micah" => 32, "nahum" => 33, "habakkuk" => 34, "zephaniah" => 35,
    "haggai" => 36, "zechariah" => 37, "malachi" => 38, "matthew" => 39,
    "mark" => 40, "luke" => 41, "john" => 42, "acts" => 43,
    "romans" => 44, "1-corinthians" => 45, "2-corinthians" => 46, "galatians" => 47,
    "ephesians" => 48, "philippians" => 49, "colossians" => 50, "1-thessalonians" => 51,
    "2-thessalonians" => 52, "1-timothy" => 53, "2-timothy" => 54, "titus" => 55,
    "philemon" => 56, "hebrews" => 57, "james" => 58, "1-peter" => 59,
    "2-peter" => 60, "1-john" => 61, "2-john" => 62, "3-john" => 63,
    "jude" => 64, "revelation" => 65,
};

/// 别名（已规范化的 slug）→ 标准标识
static BOOK_ALIASES: phf::Map<&'static str, &'static str> = phf_map! {
    // 葡萄牙语
    "exodo" => "exodus",
    "levitico" => "leviticus",
    "numeros" => "numbers",
    "deuteronomio" => "deuteronomy",
    "josue" => "joshua",
    "juizes" => "judges",
    "rute" => "ruth",
    "1-reis" => "1-kings",
    "2-reis" => "2-kings",
    "1-cronicas" => "1-chronicles",
    "2-cronicas" => "2-chronicles",
    "esdras" => "ezra",
    "neemias" => "nehemiah",
    "ester" => "esther",
    "jo" => "job",
    "salmos" => "psalms",
    "salmo" => "psalms",
    "proverbios" => "proverbs",
    "eclesiastes" => "ecclesiastes",
    "canticos" => "song-of-solomon",
    "cantico-dos-canticos" => "song-of-solomon",
    "canticos-dos-canticos" => "song-of-solomon",
    "cantares" => "song-of-solomon",
    "isaias" => "isaiah",
    "jeremias" => "jeremiah",
    "lamentacoes" => "lamentations",
    "lamentacoes-de-jeremias" => "lamentations",
    "ezequiel" => "ezekiel",
    "oseias" => "hosea",
    "obadias" => "obadiah",
    "jonas" => "jonah",
    "miqueias" => "micah",
    "naum" => "nahum",
    "habacuque" => "habakkuk",
    "sofonias" => "zephaniah",
    "ageu" => "haggai",
    "zacarias" => "zechariah",
    "malaquias" => "malachi",
    "mateus" => "matthew",
    "marcos" => "mark",
    "lucas" => "luke",
    "joao" => "john",
    "atos" => "acts",
    "atos-dos-apostolos" => "acts",
    "romanos" => "romans",
    "1-corintios" => "1-corinthians",
    "2-corintios" => "2-corinthians",
    "galatas" => "galatians",
    "efesios" => "ephesians",
    "filipenses" => "philippians",
    "colossenses" => "colossians",
    "1-tessalonicenses" => "1-thessalonians",
    "2-tessalonicenses" => "2-thessalonians",
    "1-timoteo" => "1-timothy",
    "2-timoteo" => "2-timothy",
    "tito" => "titus",
    "filemom" => "philemon",
    "filemon" => "philemon",
    "hebreus" => "hebrews",
    "tiago" => "james",
    "1-pedro" => "1-peter",
    "2-pedro" => "2-peter",
    "1-joao" => "1-john",
    "2-joao" => "2-john",
    "3-joao" => "3-john",
    "judas" => "jude",
    "apocalipse" => "revelation",
    // 英语变体
    "psalm" => "psalms",
    "song-of-songs" => "song-of-solomon",
    "canticles" => "song-of-solomon",
    "revelations" => "revelation",
    "acts-of-the-apostles" => "acts",
};

/// 按标准标识查找
pub fn by_id(id: &str) -> Option<&'static Book> {
    BOOK_INDEX.get(id).map(|&index| &BOOKS[index])
}

/// 按已规范化的 slug 查找（标准标识或别名）
pub fn by_slug(slug: &str) -> Option<&'static Book> {
    by_id(slug).or_else(|| BOOK_ALIASES.get(slug).and_then(|id| by_id(id)))
}

/// 书卷的章节数
pub fn chapter_count(id: &str) -> Option<u32> {
    by_id(id).map(|book| book.chapters)
}
