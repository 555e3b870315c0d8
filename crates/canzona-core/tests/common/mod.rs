//! Shared fixtures: a version-0 library database and helpers to bring it to
//! any intermediate version.

#![allow(dead_code)]

use canzona_core::schema::detect::{CONFIGURATION_TABLE, LEGACY_CONFIGURATION_TABLE};
use canzona_core::{ConnectionProvider, MigrationOptions, Migrator, SchemaVersion, SqliteFile};
use rusqlite::Connection;
use tempfile::TempDir;

/// The oldest layout an upgrade can start from: plural table names, disc
/// numbers on albums, free-text genres, no indexes.
pub const LEGACY_V0_SQL: &str = r#"
CREATE TABLE Configurations (
    ConfigurationID INTEGER,
    Key             TEXT,
    Value           TEXT,
    PRIMARY KEY(ConfigurationID)
);

INSERT INTO Configurations (ConfigurationID, Key, Value) VALUES (NULL, 'DatabaseVersion', '0');

CREATE TABLE Artists (
    ArtistID   INTEGER,
    ArtistName TEXT,
    PRIMARY KEY(ArtistID)
);

CREATE TABLE Albums (
    AlbumID                         INTEGER,
    AlbumTitle                      TEXT,
    AlbumArtist                     TEXT,
    DiscNumber                      INTEGER,
    DiscCount                       INTEGER,
    EmbeddedArtworkID               TEXT,
    EmbeddedArtworkSize             INTEGER,
    ExternalArtworkID               TEXT,
    ExternalArtworkSize             INTEGER,
    ExternalArtworkPath             TEXT,
    ExternalArtworkDateFileModified INTEGER,
    PRIMARY KEY(AlbumID)
);

CREATE TABLE Folders (
    FolderID INTEGER,
    Path     TEXT,
    PRIMARY KEY(FolderID)
);

CREATE TABLE Tracks (
    TrackID          INTEGER,
    ArtistID         INTEGER,
    AlbumID          INTEGER,
    Path             TEXT,
    FileName         TEXT,
    MimeType         TEXT,
    FileSize         INTEGER,
    BitRate          INTEGER,
    SampleRate       INTEGER,
    TrackTitle       TEXT,
    TrackNumber      INTEGER,
    TrackCount       INTEGER,
    Duration         INTEGER,
    Year             INTEGER,
    Genre            TEXT,
    Rating           INTEGER,
    PlayCount        INTEGER,
    SkipCount        INTEGER,
    DateAdded        INTEGER,
    DateLastPlayed   INTEGER,
    DateLastSynced   INTEGER,
    DateFileModified INTEGER,
    MetaDataHash     TEXT,
    PRIMARY KEY(TrackID)
);

CREATE TABLE Playlists (
    PlaylistID   INTEGER,
    PlaylistName TEXT,
    PRIMARY KEY(PlaylistID)
);

CREATE TABLE PlaylistEntries (
    EntryID    INTEGER,
    PlaylistID INTEGER,
    TrackID    INTEGER,
    PRIMARY KEY(EntryID)
);
"#;

/// A small library with a duplicated album, nested folders, and a blank genre.
pub const LIBRARY_SQL: &str = r#"
INSERT INTO Artists (ArtistID, ArtistName) VALUES (1, 'The Beatles');

INSERT INTO Albums (AlbumID, AlbumTitle, AlbumArtist, DiscNumber, DiscCount)
    VALUES (1, 'Abbey Road', 'Beatles', 1, 2);
INSERT INTO Albums (AlbumID, AlbumTitle, AlbumArtist, DiscNumber, DiscCount)
    VALUES (5, ' abbey road ', 'beatles', 2, 2);
INSERT INTO Albums (AlbumID, AlbumTitle, AlbumArtist, DiscNumber, DiscCount)
    VALUES (7, 'Unknown Album', 'Unknown Artist', 1, 1);

INSERT INTO Folders (FolderID, Path) VALUES (1, 'C:\Music');
INSERT INTO Folders (FolderID, Path) VALUES (2, 'C:\Music\Beatles');

INSERT INTO Tracks (TrackID, ArtistID, AlbumID, Path, FileName, TrackTitle, Year, Genre,
                    Rating, PlayCount, SkipCount, DateAdded, DateLastPlayed)
    VALUES (1, 1, 1, 'C:\Music\Beatles\Come Together.mp3', 'Come Together.mp3', 'Come Together',
            1969, 'Rock', 5, 10, 1, 100, 200);
INSERT INTO Tracks (TrackID, ArtistID, AlbumID, Path, FileName, TrackTitle, Year, Genre,
                    Rating, PlayCount, SkipCount, DateAdded, DateLastPlayed)
    VALUES (2, 1, 5, 'C:\Music\Beatles\Something.mp3', 'Something.mp3', 'Something',
            1969, '  ', 0, 3, 0, 50, 150);
INSERT INTO Tracks (TrackID, ArtistID, AlbumID, Path, FileName, TrackTitle, Year, Genre,
                    Rating, PlayCount, SkipCount, DateAdded, DateLastPlayed)
    VALUES (3, NULL, 7, 'C:\Music\misc.mp3', 'misc.mp3', 'Misc', NULL, 'Rock', 0, 0, 0, 300, NULL);

INSERT INTO Playlists (PlaylistID, PlaylistName) VALUES (1, 'Favourites');
INSERT INTO PlaylistEntries (EntryID, PlaylistID, TrackID) VALUES (1, 1, 1);
"#;

pub fn temp_provider() -> (TempDir, SqliteFile) {
    let dir = TempDir::new().unwrap();
    let provider = SqliteFile::new(dir.path().join("library.db"));
    (dir, provider)
}

pub fn quiet_migrator(provider: SqliteFile) -> Migrator<SqliteFile> {
    Migrator::new(provider).with_options(MigrationOptions { compact: false })
}

/// Set the stored version in whichever configuration table exists.
pub fn set_marker(conn: &Connection, version: u32) {
    let table = if version >= 11 {
        CONFIGURATION_TABLE
    } else {
        LEGACY_CONFIGURATION_TABLE
    };
    conn.execute(
        &format!("UPDATE {table} SET Value = ?1 WHERE Key = 'DatabaseVersion'"),
        [version.to_string()],
    )
    .unwrap();
}

/// A database at `version`, optionally seeded with [`LIBRARY_SQL`] at
/// version 0, built by replaying the registry.
pub fn database_at(version: u32, seeded: bool) -> (TempDir, SqliteFile) {
    let (dir, provider) = temp_provider();
    {
        let conn = provider.acquire().unwrap();
        conn.execute_batch(LEGACY_V0_SQL).unwrap();
        if seeded {
            conn.execute_batch(LIBRARY_SQL).unwrap();
        }
    }

    quiet_migrator(provider.clone())
        .apply_steps(SchemaVersion::new(0), SchemaVersion::new(version))
        .unwrap();

    let conn = provider.acquire().unwrap();
    set_marker(&conn, version);

    (dir, provider)
}

pub fn column_i64(conn: &Connection, sql: &str) -> Vec<Option<i64>> {
    let mut stmt = conn.prepare(sql).unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap()
}

pub fn table_exists(conn: &Connection, name: &str) -> bool {
    canzona_core::schema::detect::table_exists(conn, name).unwrap()
}
