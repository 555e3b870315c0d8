//! Direct creation of the current schema for a new database.
//!
//! This does not replay the migration history. Keep it structurally equal to
//! what the registry produces from version 0; the equivalence tests compare
//! the two.

use rusqlite::Connection;

use crate::version::CURRENT_VERSION;

use super::detect::{CONFIGURATION_TABLE, VERSION_KEY};

const CONFIGURATION_SQL: &str = r#"
CREATE TABLE Configuration (
    ConfigurationID INTEGER,
    Key             TEXT,
    Value           TEXT,
    PRIMARY KEY(ConfigurationID)
);
"#;

const TABLES_SQL: &str = r#"
CREATE TABLE Artist (
    ArtistID   INTEGER,
    ArtistName TEXT,
    PRIMARY KEY(ArtistID)
);

CREATE INDEX ArtistIndex ON Artist(ArtistName);

CREATE TABLE Genre (
    GenreID   INTEGER,
    GenreName TEXT,
    PRIMARY KEY(GenreID)
);

CREATE INDEX GenreIndex ON Genre(GenreName);

CREATE TABLE Album (
    AlbumID        INTEGER,
    AlbumTitle     TEXT,
    AlbumArtist    TEXT,
    Year           INTEGER,
    ArtworkID      TEXT,
    DateLastSynced INTEGER,
    DateAdded      INTEGER,
    DateCreated    INTEGER,
    PRIMARY KEY(AlbumID)
);

CREATE INDEX AlbumIndex ON Album(AlbumTitle, AlbumArtist);
CREATE INDEX AlbumYearIndex ON Album(Year);

CREATE TABLE Folder (
    FolderID         INTEGER PRIMARY KEY AUTOINCREMENT,
    Path             TEXT,
    SafePath         TEXT,
    ShowInCollection INTEGER
);

CREATE TABLE Track (
    TrackID          INTEGER,
    ArtistID         INTEGER,
    GenreID          INTEGER,
    AlbumID          INTEGER,
    FolderID         INTEGER,
    Path             TEXT,
    SafePath         TEXT,
    FileName         TEXT,
    MimeType         TEXT,
    FileSize         INTEGER,
    BitRate          INTEGER,
    SampleRate       INTEGER,
    TrackTitle       TEXT,
    TrackNumber      INTEGER,
    TrackCount       INTEGER,
    DiscNumber       INTEGER,
    DiscCount        INTEGER,
    Duration         INTEGER,
    Year             INTEGER,
    HasLyrics        INTEGER,
    DateAdded        INTEGER,
    DateLastSynced   INTEGER,
    DateFileModified INTEGER,
    MetaDataHash     TEXT,
    NeedsIndexing    INTEGER,
    PRIMARY KEY(TrackID)
);

CREATE INDEX TrackArtistIDIndex ON Track(ArtistID);
CREATE INDEX TrackAlbumIDIndex ON Track(AlbumID);
CREATE INDEX TrackGenreIDIndex ON Track(GenreID);
CREATE INDEX TrackFolderIDIndex ON Track(FolderID);
CREATE INDEX TrackPathIndex ON Track(Path);
CREATE INDEX TrackSafePathIndex ON Track(SafePath);

CREATE TABLE RemovedTrack (
    TrackID     INTEGER,
    Path        TEXT,
    SafePath    TEXT,
    DateRemoved INTEGER,
    PRIMARY KEY(TrackID)
);

CREATE TABLE QueuedTrack (
    QueuedTrackID   INTEGER,
    QueueID         TEXT,
    Path            TEXT,
    SafePath        TEXT,
    IsPlaying       INTEGER,
    ProgressSeconds INTEGER,
    OrderID         INTEGER,
    PRIMARY KEY(QueuedTrackID)
);

CREATE TABLE IndexingStatistic (
    IndexingStatisticID INTEGER,
    Key                 TEXT,
    Value               TEXT,
    PRIMARY KEY(IndexingStatisticID)
);

CREATE TABLE TrackStatistic (
    TrackStatisticID INTEGER PRIMARY KEY AUTOINCREMENT,
    Path             TEXT,
    SafePath         TEXT,
    Rating           INTEGER,
    Love             INTEGER,
    PlayCount        INTEGER,
    SkipCount        INTEGER,
    DateLastPlayed   INTEGER
);

CREATE INDEX TrackStatisticSafePathIndex ON TrackStatistic(SafePath);
"#;

/// Create the configuration table, the version marker, and every entity
/// table at the current shape. Runs in one transaction.
pub fn create_schema(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(CONFIGURATION_SQL)?;
    tx.execute(
        &format!("INSERT INTO {CONFIGURATION_TABLE} (ConfigurationID, Key, Value) VALUES (NULL, ?1, ?2)"),
        rusqlite::params![VERSION_KEY, CURRENT_VERSION.to_string()],
    )?;
    tx.execute_batch(TABLES_SQL)?;
    tx.commit()
}
