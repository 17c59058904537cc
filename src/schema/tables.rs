//! Table schema definitions for the IMDB Join Order Benchmark dataset

use super::types::*;

use super::types::ColumnType::{Integer, Text, Varchar};

// =============================================================================
// Dimension Tables
// =============================================================================

pub static COMP_CAST_TYPE: TableSchema = TableSchema {
    name: "comp_cast_type",
    columns: &[
        Column::required("id", Integer),
        Column::required("kind", Varchar(32)),
    ],
    references: &[],
};

pub static COMPANY_TYPE: TableSchema = TableSchema {
    name: "company_type",
    columns: &[
        Column::required("id", Integer),
        Column::required("kind", Varchar(32)),
    ],
    references: &[],
};

pub static INFO_TYPE: TableSchema = TableSchema {
    name: "info_type",
    columns: &[
        Column::required("id", Integer),
        Column::required("info", Varchar(32)),
    ],
    references: &[],
};

pub static KIND_TYPE: TableSchema = TableSchema {
    name: "kind_type",
    columns: &[
        Column::required("id", Integer),
        Column::required("kind", Varchar(15)),
    ],
    references: &[],
};

pub static LINK_TYPE: TableSchema = TableSchema {
    name: "link_type",
    columns: &[
        Column::required("id", Integer),
        Column::required("link", Varchar(32)),
    ],
    references: &[],
};

pub static ROLE_TYPE: TableSchema = TableSchema {
    name: "role_type",
    columns: &[
        Column::required("id", Integer),
        Column::required("role", Varchar(32)),
    ],
    references: &[],
};

// =============================================================================
// Entity Tables
// =============================================================================

pub static CHAR_NAME: TableSchema = TableSchema {
    name: "char_name",
    columns: &[
        Column::required("id", Integer),
        Column::required("name", Text),
        Column::new("imdb_index", Varchar(12)),
        Column::new("imdb_id", Integer),
        Column::new("name_pcode_nf", Varchar(5)),
        Column::new("surname_pcode", Varchar(5)),
        Column::new("md5sum", Varchar(32)),
    ],
    references: &[],
};

pub static COMPANY_NAME: TableSchema = TableSchema {
    name: "company_name",
    columns: &[
        Column::required("id", Integer),
        Column::required("name", Text),
        Column::new("country_code", Varchar(255)),
        Column::new("imdb_id", Integer),
        Column::new("name_pcode_nf", Varchar(5)),
        Column::new("name_pcode_sf", Varchar(5)),
        Column::new("md5sum", Varchar(32)),
    ],
    references: &[],
};

pub static KEYWORD: TableSchema = TableSchema {
    name: "keyword",
    columns: &[
        Column::required("id", Integer),
        Column::required("keyword", Text),
        Column::new("phonetic_code", Varchar(5)),
    ],
    references: &[],
};

pub static NAME: TableSchema = TableSchema {
    name: "name",
    columns: &[
        Column::required("id", Integer),
        Column::required("name", Text),
        Column::new("imdb_index", Varchar(12)),
        Column::new("imdb_id", Integer),
        Column::new("gender", Varchar(1)),
        Column::new("name_pcode_cf", Varchar(5)),
        Column::new("name_pcode_nf", Varchar(5)),
        Column::new("surname_pcode", Varchar(5)),
        Column::new("md5sum", Varchar(32)),
    ],
    references: &[],
};

pub static TITLE: TableSchema = TableSchema {
    name: "title",
    columns: &[
        Column::required("id", Integer),
        Column::required("title", Text),
        Column::new("imdb_index", Varchar(12)),
        Column::required("kind_id", Integer),
        Column::new("production_year", Integer),
        Column::new("imdb_id", Integer),
        Column::new("phonetic_code", Varchar(5)),
        Column::new("episode_of_id", Integer),
        Column::new("season_nr", Integer),
        Column::new("episode_nr", Integer),
        Column::new("series_years", Varchar(49)),
        Column::new("md5sum", Varchar(32)),
    ],
    references: &[
        Reference::new("kind_id", "kind_type"),
        Reference::new("episode_of_id", "title"),
    ],
};

// =============================================================================
// Alias Tables
// =============================================================================

pub static AKA_NAME: TableSchema = TableSchema {
    name: "aka_name",
    columns: &[
        Column::required("id", Integer),
        Column::required("person_id", Integer),
        Column::required("name", Text),
        Column::new("imdb_index", Varchar(12)),
        Column::new("name_pcode_cf", Varchar(5)),
        Column::new("name_pcode_nf", Varchar(5)),
        Column::new("surname_pcode", Varchar(5)),
        Column::new("md5sum", Varchar(32)),
    ],
    references: &[Reference::new("person_id", "name")],
};

pub static AKA_TITLE: TableSchema = TableSchema {
    name: "aka_title",
    columns: &[
        Column::required("id", Integer),
        Column::required("movie_id", Integer),
        Column::required("title", Text),
        Column::new("imdb_index", Varchar(12)),
        Column::required("kind_id", Integer),
        Column::new("production_year", Integer),
        Column::new("phonetic_code", Varchar(5)),
        Column::new("episode_of_id", Integer),
        Column::new("season_nr", Integer),
        Column::new("episode_nr", Integer),
        Column::new("note", Text),
        Column::new("md5sum", Varchar(32)),
    ],
    references: &[
        Reference::new("movie_id", "title"),
        Reference::new("kind_id", "kind_type"),
        Reference::new("episode_of_id", "title"),
    ],
};

// =============================================================================
// Linking Tables
// =============================================================================

pub static CAST_INFO: TableSchema = TableSchema {
    name: "cast_info",
    columns: &[
        Column::required("id", Integer),
        Column::required("person_id", Integer),
        Column::required("movie_id", Integer),
        Column::new("person_role_id", Integer),
        Column::new("note", Text),
        Column::new("nr_order", Integer),
        Column::required("role_id", Integer),
    ],
    references: &[
        Reference::new("person_id", "name"),
        Reference::new("movie_id", "title"),
        Reference::new("person_role_id", "char_name"),
        Reference::new("role_id", "role_type"),
    ],
};

pub static COMPLETE_CAST: TableSchema = TableSchema {
    name: "complete_cast",
    columns: &[
        Column::required("id", Integer),
        Column::new("movie_id", Integer),
        Column::required("subject_id", Integer),
        Column::required("status_id", Integer),
    ],
    references: &[
        Reference::new("movie_id", "title"),
        Reference::new("subject_id", "comp_cast_type"),
        Reference::new("status_id", "comp_cast_type"),
    ],
};

pub static MOVIE_COMPANIES: TableSchema = TableSchema {
    name: "movie_companies",
    columns: &[
        Column::required("id", Integer),
        Column::required("movie_id", Integer),
        Column::required("company_id", Integer),
        Column::required("company_type_id", Integer),
        Column::new("note", Text),
    ],
    references: &[
        Reference::new("movie_id", "title"),
        Reference::new("company_id", "company_name"),
        Reference::new("company_type_id", "company_type"),
    ],
};

pub static MOVIE_INFO: TableSchema = TableSchema {
    name: "movie_info",
    columns: &[
        Column::required("id", Integer),
        Column::required("movie_id", Integer),
        Column::required("info_type_id", Integer),
        Column::required("info", Text),
        Column::new("note", Text),
    ],
    references: &[
        Reference::new("movie_id", "title"),
        Reference::new("info_type_id", "info_type"),
    ],
};

pub static MOVIE_INFO_IDX: TableSchema = TableSchema {
    name: "movie_info_idx",
    columns: &[
        Column::required("id", Integer),
        Column::required("movie_id", Integer),
        Column::required("info_type_id", Integer),
        Column::required("info", Text),
        Column::new("note", Text),
    ],
    references: &[
        Reference::new("movie_id", "title"),
        Reference::new("info_type_id", "info_type"),
    ],
};

pub static MOVIE_KEYWORD: TableSchema = TableSchema {
    name: "movie_keyword",
    columns: &[
        Column::required("id", Integer),
        Column::required("movie_id", Integer),
        Column::required("keyword_id", Integer),
    ],
    references: &[
        Reference::new("movie_id", "title"),
        Reference::new("keyword_id", "keyword"),
    ],
};

pub static MOVIE_LINK: TableSchema = TableSchema {
    name: "movie_link",
    columns: &[
        Column::required("id", Integer),
        Column::required("movie_id", Integer),
        Column::required("linked_movie_id", Integer),
        Column::required("link_type_id", Integer),
    ],
    references: &[
        Reference::new("movie_id", "title"),
        Reference::new("linked_movie_id", "title"),
        Reference::new("link_type_id", "link_type"),
    ],
};

pub static PERSON_INFO: TableSchema = TableSchema {
    name: "person_info",
    columns: &[
        Column::required("id", Integer),
        Column::required("person_id", Integer),
        Column::required("info_type_id", Integer),
        Column::required("info", Text),
        Column::new("note", Text),
    ],
    references: &[
        Reference::new("person_id", "name"),
        Reference::new("info_type_id", "info_type"),
    ],
};

// =============================================================================
// Schema Registry
// =============================================================================

/// All table schemas in load order. References are not enforced, so the
/// order is the alphabetical order of the JOB dump.
pub static ALL_TABLES: &[&TableSchema] = &[
    &AKA_NAME,
    &AKA_TITLE,
    &CAST_INFO,
    &CHAR_NAME,
    &COMP_CAST_TYPE,
    &COMPANY_NAME,
    &COMPANY_TYPE,
    &COMPLETE_CAST,
    &INFO_TYPE,
    &KEYWORD,
    &KIND_TYPE,
    &LINK_TYPE,
    &MOVIE_COMPANIES,
    &MOVIE_INFO,
    &MOVIE_INFO_IDX,
    &MOVIE_KEYWORD,
    &MOVIE_LINK,
    &NAME,
    &PERSON_INFO,
    &ROLE_TYPE,
    &TITLE,
];

/// Secondary indexes on the reference columns queried by the JOB workload
pub static ALL_INDEXES: &[IndexDef] = &[
    IndexDef::new("company_id_movie_companies", "movie_companies", &["company_id"]),
    IndexDef::new("company_type_id_movie_companies", "movie_companies", &["company_type_id"]),
    IndexDef::new("info_type_id_movie_info_idx", "movie_info_idx", &["info_type_id"]),
    IndexDef::new("info_type_id_movie_info", "movie_info", &["info_type_id"]),
    IndexDef::new("info_type_id_person_info", "person_info", &["info_type_id"]),
    IndexDef::new("keyword_id_movie_keyword", "movie_keyword", &["keyword_id"]),
    IndexDef::new("kind_id_aka_title", "aka_title", &["kind_id"]),
    IndexDef::new("kind_id_title", "title", &["kind_id"]),
    IndexDef::new("linked_movie_id_movie_link", "movie_link", &["linked_movie_id"]),
    IndexDef::new("link_type_id_movie_link", "movie_link", &["link_type_id"]),
    IndexDef::new("movie_id_aka_title", "aka_title", &["movie_id"]),
    IndexDef::new("movie_id_cast_info", "cast_info", &["movie_id"]),
    IndexDef::new("movie_id_complete_cast", "complete_cast", &["movie_id"]),
    IndexDef::new("movie_id_movie_companies", "movie_companies", &["movie_id"]),
    IndexDef::new("movie_id_movie_info_idx", "movie_info_idx", &["movie_id"]),
    IndexDef::new("movie_id_movie_keyword", "movie_keyword", &["movie_id"]),
    IndexDef::new("movie_id_movie_link", "movie_link", &["movie_id"]),
    IndexDef::new("movie_id_movie_info", "movie_info", &["movie_id"]),
    IndexDef::new("person_id_aka_name", "aka_name", &["person_id"]),
    IndexDef::new("person_id_cast_info", "cast_info", &["person_id"]),
    IndexDef::new("person_id_person_info", "person_info", &["person_id"]),
    IndexDef::new("person_role_id_cast_info", "cast_info", &["person_role_id"]),
    IndexDef::new("role_id_cast_info", "cast_info", &["role_id"]),
];

/// Row counts of the reference JOB snapshot
pub static JOB_ROW_COUNTS: &[(&str, u64)] = &[
    ("aka_name", 901_343),
    ("aka_title", 361_472),
    ("cast_info", 36_244_344),
    ("char_name", 3_140_339),
    ("comp_cast_type", 4),
    ("company_name", 234_997),
    ("company_type", 4),
    ("complete_cast", 135_086),
    ("info_type", 113),
    ("keyword", 134_170),
    ("kind_type", 7),
    ("link_type", 18),
    ("movie_companies", 2_609_129),
    ("movie_info", 14_835_720),
    ("movie_info_idx", 1_380_035),
    ("movie_keyword", 4_523_930),
    ("movie_link", 29_997),
    ("name", 4_167_491),
    ("person_info", 2_963_664),
    ("role_type", 12),
    ("title", 2_528_312),
];

/// Get table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}

/// Index definitions that apply to the given tables
pub fn indexes_for(tables: &[&TableSchema]) -> Vec<&'static IndexDef> {
    ALL_INDEXES
        .iter()
        .filter(|idx| tables.iter().any(|t| t.name == idx.table))
        .collect()
}
