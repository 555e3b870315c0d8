use rusqlite::Connection;

use crate::ticks;
use crate::version::{SchemaVersion, CURRENT_VERSION};

use super::rebuild::{column, Dedup, ForeignKey, Index, Rebuild, TableShape};

/// Genre assigned to tracks whose genre tag was blank.
pub const UNKNOWN_GENRE: &str = "Unknown Genre";

/// Placeholder album title that never receives a release year.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// A schema migration.
///
/// `up` upgrades a database from `version - 1` to `version`. The migrator
/// runs it inside a transaction of its own.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: SchemaVersion,
    pub name: &'static str,
    pub up: fn(&Connection) -> rusqlite::Result<()>,
    /// Reclaim free pages with `VACUUM` once the step has committed.
    pub compact: bool,
}

/// An ordered set of migrations.
#[derive(Debug, Clone, Copy)]
pub struct Registry<'a> {
    steps: &'a [Migration],
}

impl<'a> Registry<'a> {
    /// Wrap `steps`, which must be strictly increasing, non-zero, and no
    /// newer than [`CURRENT_VERSION`].
    ///
    /// # Panics
    ///
    /// Panics if `steps` breaks that ordering. In a `const` context this is
    /// a compile error instead.
    pub const fn new(steps: &'a [Migration]) -> Self {
        assert!(is_well_ordered(steps), "migration registry is out of order");
        Self { steps }
    }

    pub const fn steps(&self) -> &'a [Migration] {
        self.steps
    }

    /// The step that upgrades to `version`, if one is registered.
    pub fn find(&self, version: SchemaVersion) -> Option<&'a Migration> {
        self.steps
            .binary_search_by_key(&version, |m| m.version)
            .ok()
            .map(|i| &self.steps[i])
    }

    /// Steps that would run when upgrading from `from` to `to`.
    pub fn pending(
        &self,
        from: SchemaVersion,
        to: SchemaVersion,
    ) -> impl Iterator<Item = &'a Migration> + 'a {
        self.steps
            .iter()
            .filter(move |m| m.version > from && m.version <= to)
    }
}

const fn is_well_ordered(steps: &[Migration]) -> bool {
    let mut i = 0;
    while i < steps.len() {
        let version = steps[i].version.get();
        if version == 0 || version > CURRENT_VERSION.get() {
            return false;
        }
        if i > 0 && steps[i - 1].version.get() >= version {
            return false;
        }
        i += 1;
    }
    true
}

const fn step(
    version: u32,
    name: &'static str,
    up: fn(&Connection) -> rusqlite::Result<()>,
    compact: bool,
) -> Migration {
    Migration {
        version: SchemaVersion::new(version),
        name,
        up,
        compact,
    }
}

pub const MIGRATIONS: &[Migration] = &[
    step(1, "disc_numbers_and_album_dedup", migrate_1, true),
    step(2, "album_sync_columns", migrate_2, true),
    step(3, "removed_tracks", migrate_3, true),
    step(4, "genres", migrate_4, false),
    step(5, "album_year", migrate_5, false),
    step(6, "track_folders", migrate_6, false),
    step(7, "folder_visibility", migrate_7, false),
    step(8, "queued_tracks", migrate_8, false),
    step(9, "indexing_statistics", migrate_9, false),
    step(10, "folder_autoincrement", migrate_10, true),
    step(11, "singular_table_names", migrate_11, true),
    step(12, "safe_paths", migrate_12, true),
    step(13, "track_love", migrate_13, true),
    step(14, "queue_playback_state", migrate_14, true),
    step(15, "lyrics_and_reindex", migrate_15, true),
    step(16, "track_statistics", migrate_16, true),
    step(17, "queue_ids", migrate_17, true),
    step(18, "drop_playlists", migrate_18, true),
    step(19, "album_date_created", migrate_19, true),
];

const _: () = assert!(is_well_ordered(MIGRATIONS), "MIGRATIONS is out of order");

/// The registry used for every real upgrade.
pub const REGISTRY: Registry<'static> = Registry::new(MIGRATIONS);

// Version 1: disc numbers move from albums to tracks, and albums that only
// differ in case or surrounding whitespace are merged.

static ALBUMS_V1: TableShape = TableShape {
    name: "Albums",
    columns: &[
        column("AlbumID", "INTEGER"),
        column("AlbumTitle", "TEXT"),
        column("AlbumArtist", "TEXT"),
        column("EmbeddedArtworkID", "TEXT"),
        column("EmbeddedArtworkSize", "INTEGER"),
        column("ExternalArtworkID", "TEXT"),
        column("ExternalArtworkSize", "INTEGER"),
        column("ExternalArtworkPath", "TEXT"),
        column("ExternalArtworkDateFileModified", "INTEGER"),
    ],
    primary_key: Some("AlbumID"),
};

static ALBUM_DEDUP: Dedup = Dedup {
    identity: "AlbumID",
    natural_key: &["AlbumTitle", "AlbumArtist"],
    dependents: &[ForeignKey {
        table: "Tracks",
        column: "AlbumID",
    }],
};

fn migrate_1(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "ALTER TABLE Tracks ADD DiscNumber INTEGER;
         ALTER TABLE Tracks ADD DiscCount INTEGER;
         UPDATE Tracks SET DiscNumber = (SELECT DiscNumber FROM Albums WHERE Albums.AlbumID = Tracks.AlbumID);
         UPDATE Tracks SET DiscCount = (SELECT DiscCount FROM Albums WHERE Albums.AlbumID = Tracks.AlbumID);",
    )?;
    Rebuild::new(&ALBUMS_V1)
        .with_dedup(&ALBUM_DEDUP)
        .run(conn)
}

// Version 2: artwork columns leave the album table.

static ALBUMS_V2: TableShape = TableShape {
    name: "Albums",
    columns: &[
        column("AlbumID", "INTEGER"),
        column("AlbumTitle", "TEXT"),
        column("AlbumArtist", "TEXT"),
        column("Year", "INTEGER"),
        column("ArtworkID", "TEXT"),
        column("DateLastSynced", "INTEGER"),
    ],
    primary_key: Some("AlbumID"),
};

fn migrate_2(conn: &Connection) -> rusqlite::Result<()> {
    Rebuild::new(&ALBUMS_V2)
        .with_source(&["AlbumID", "AlbumTitle", "AlbumArtist", "0", "NULL", "0"])
        .with_indexes(&[Index {
            name: "AlbumsIndex",
            table: "Albums",
            columns: "AlbumTitle, AlbumArtist",
        }])
        .run(conn)?;
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS TracksArtistIDIndex ON Tracks(ArtistID);
         CREATE INDEX IF NOT EXISTS TracksAlbumIDIndex ON Tracks(AlbumID);
         CREATE INDEX IF NOT EXISTS TracksPathIndex ON Tracks(Path);
         CREATE INDEX IF NOT EXISTS ArtistsIndex ON Artists(ArtistName);",
    )
}

// Version 3: removed-track bookkeeping; track columns are reordered so the
// disc columns added in version 1 sit next to the track numbers.

static TRACKS_V3: TableShape = TableShape {
    name: "Tracks",
    columns: &[
        column("TrackID", "INTEGER"),
        column("ArtistID", "INTEGER"),
        column("AlbumID", "INTEGER"),
        column("Path", "TEXT"),
        column("FileName", "TEXT"),
        column("MimeType", "TEXT"),
        column("FileSize", "INTEGER"),
        column("BitRate", "INTEGER"),
        column("SampleRate", "INTEGER"),
        column("TrackTitle", "TEXT"),
        column("TrackNumber", "INTEGER"),
        column("TrackCount", "INTEGER"),
        column("DiscNumber", "INTEGER"),
        column("DiscCount", "INTEGER"),
        column("Duration", "INTEGER"),
        column("Year", "INTEGER"),
        column("Genre", "TEXT"),
        column("Rating", "INTEGER"),
        column("PlayCount", "INTEGER"),
        column("SkipCount", "INTEGER"),
        column("DateAdded", "INTEGER"),
        column("DateLastPlayed", "INTEGER"),
        column("DateLastSynced", "INTEGER"),
        column("DateFileModified", "INTEGER"),
        column("MetaDataHash", "TEXT"),
    ],
    primary_key: Some("TrackID"),
};

const TRACKS_V3_INDEXES: &[Index] = &[
    Index {
        name: "TracksArtistIDIndex",
        table: "Tracks",
        columns: "ArtistID",
    },
    Index {
        name: "TracksAlbumIDIndex",
        table: "Tracks",
        columns: "AlbumID",
    },
    Index {
        name: "TracksPathIndex",
        table: "Tracks",
        columns: "Path",
    },
];

fn migrate_3(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE RemovedTracks (
             TrackID     INTEGER,
             Path        TEXT,
             DateRemoved INTEGER,
             PRIMARY KEY(TrackID)
         );",
    )?;
    Rebuild::new(&TRACKS_V3)
        .with_indexes(TRACKS_V3_INDEXES)
        .run(conn)?;
    conn.execute_batch(
        "ALTER TABLE Albums ADD DateAdded INTEGER;
         UPDATE Albums SET DateAdded = (SELECT MIN(DateAdded) FROM Tracks WHERE Tracks.AlbumID = Albums.AlbumID);",
    )
}

// Version 4: free-text genres become rows in a Genres table.

static TRACKS_V4: TableShape = TableShape {
    name: "Tracks",
    columns: &[
        column("TrackID", "INTEGER"),
        column("ArtistID", "INTEGER"),
        column("GenreID", "INTEGER"),
        column("AlbumID", "INTEGER"),
        column("Path", "TEXT"),
        column("FileName", "TEXT"),
        column("MimeType", "TEXT"),
        column("FileSize", "INTEGER"),
        column("BitRate", "INTEGER"),
        column("SampleRate", "INTEGER"),
        column("TrackTitle", "TEXT"),
        column("TrackNumber", "INTEGER"),
        column("TrackCount", "INTEGER"),
        column("DiscNumber", "INTEGER"),
        column("DiscCount", "INTEGER"),
        column("Duration", "INTEGER"),
        column("Year", "INTEGER"),
        column("Rating", "INTEGER"),
        column("PlayCount", "INTEGER"),
        column("SkipCount", "INTEGER"),
        column("DateAdded", "INTEGER"),
        column("DateLastPlayed", "INTEGER"),
        column("DateLastSynced", "INTEGER"),
        column("DateFileModified", "INTEGER"),
        column("MetaDataHash", "TEXT"),
    ],
    primary_key: Some("TrackID"),
};

const TRACKS_V4_INDEXES: &[Index] = &[
    Index {
        name: "TracksArtistIDIndex",
        table: "Tracks",
        columns: "ArtistID",
    },
    Index {
        name: "TracksAlbumIDIndex",
        table: "Tracks",
        columns: "AlbumID",
    },
    Index {
        name: "TracksPathIndex",
        table: "Tracks",
        columns: "Path",
    },
    Index {
        name: "TracksGenreIDIndex",
        table: "Tracks",
        columns: "GenreID",
    },
];

fn migrate_4(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE Genres (
             GenreID   INTEGER,
             GenreName TEXT,
             PRIMARY KEY(GenreID)
         );
         ALTER TABLE Tracks ADD GenreID INTEGER;
         INSERT INTO Genres (GenreName) SELECT DISTINCT Genre FROM Tracks WHERE TRIM(Genre) <> '';
         UPDATE Tracks SET GenreID = (SELECT GenreID FROM Genres WHERE Genres.GenreName = Tracks.Genre)
             WHERE TRIM(Genre) <> '';",
    )?;
    conn.execute("INSERT INTO Genres (GenreName) VALUES (?1)", [UNKNOWN_GENRE])?;
    conn.execute(
        "UPDATE Tracks SET GenreID = (SELECT GenreID FROM Genres WHERE GenreName = ?1 ORDER BY GenreID DESC LIMIT 1)
             WHERE IFNULL(TRIM(Genre), '') = ''",
        [UNKNOWN_GENRE],
    )?;
    Rebuild::new(&TRACKS_V4)
        .with_indexes(TRACKS_V4_INDEXES)
        .run(conn)?;
    conn.execute_batch("CREATE INDEX GenresIndex ON Genres(GenreName);")
}

// Version 5: albums take the latest year of their tracks.

fn migrate_5(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE Albums SET Year = (SELECT MAX(Year) FROM Tracks WHERE Tracks.AlbumID = Albums.AlbumID)
             WHERE AlbumTitle <> ?1",
        [UNKNOWN_ALBUM],
    )?;
    conn.execute_batch("CREATE INDEX IF NOT EXISTS AlbumsYearIndex ON Albums(Year);")
}

// Version 6: each track points at the deepest collection folder containing it.

fn migrate_6(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "ALTER TABLE Tracks ADD FolderID INTEGER;
         UPDATE Tracks SET FolderID = (
             SELECT FolderID FROM Folders
             WHERE SUBSTR(UPPER(Tracks.Path), 1, LENGTH(Folders.Path)) = UPPER(Folders.Path)
             ORDER BY LENGTH(Folders.Path) DESC
             LIMIT 1
         );
         CREATE INDEX IF NOT EXISTS TracksFolderIDIndex ON Tracks(FolderID);",
    )
}

fn migrate_7(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "ALTER TABLE Folders ADD ShowInCollection INTEGER;
         UPDATE Folders SET ShowInCollection = 1;",
    )
}

fn migrate_8(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE QueuedTracks (
             QueuedTrackID INTEGER,
             Path          TEXT,
             OrderID       INTEGER,
             PRIMARY KEY(QueuedTrackID)
         );",
    )
}

fn migrate_9(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IndexingStatistics (
             IndexingStatisticID INTEGER,
             Key                 TEXT,
             Value               TEXT,
             PRIMARY KEY(IndexingStatisticID)
         );",
    )
}

// Version 10: folder ids are never reused.

static FOLDERS_V10: TableShape = TableShape {
    name: "Folders",
    columns: &[
        column("FolderID", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        column("Path", "TEXT"),
        column("ShowInCollection", "INTEGER"),
    ],
    primary_key: None,
};

fn migrate_10(conn: &Connection) -> rusqlite::Result<()> {
    Rebuild::new(&FOLDERS_V10).run(conn)
}

// Version 11: every table takes a singular name. The configuration table is
// renamed here too, which is why version detection has a legacy fallback.

const SINGULAR_NAMES: [(&str, &str); 11] = [
    ("Configurations", "Configuration"),
    ("Artists", "Artist"),
    ("Genres", "Genre"),
    ("Albums", "Album"),
    ("Playlists", "Playlist"),
    ("PlaylistEntries", "PlaylistEntry"),
    ("Folders", "Folder"),
    ("Tracks", "Track"),
    ("RemovedTracks", "RemovedTrack"),
    ("QueuedTracks", "QueuedTrack"),
    ("IndexingStatistics", "IndexingStatistic"),
];

const PLURAL_INDEXES: [&str; 9] = [
    "ArtistsIndex",
    "GenresIndex",
    "AlbumsIndex",
    "AlbumsYearIndex",
    "TracksArtistIDIndex",
    "TracksAlbumIDIndex",
    "TracksGenreIDIndex",
    "TracksFolderIDIndex",
    "TracksPathIndex",
];

const SINGULAR_INDEXES: &[Index] = &[
    Index {
        name: "ArtistIndex",
        table: "Artist",
        columns: "ArtistName",
    },
    Index {
        name: "GenreIndex",
        table: "Genre",
        columns: "GenreName",
    },
    Index {
        name: "AlbumIndex",
        table: "Album",
        columns: "AlbumTitle, AlbumArtist",
    },
    Index {
        name: "AlbumYearIndex",
        table: "Album",
        columns: "Year",
    },
    Index {
        name: "TrackArtistIDIndex",
        table: "Track",
        columns: "ArtistID",
    },
    Index {
        name: "TrackAlbumIDIndex",
        table: "Track",
        columns: "AlbumID",
    },
    Index {
        name: "TrackGenreIDIndex",
        table: "Track",
        columns: "GenreID",
    },
    Index {
        name: "TrackFolderIDIndex",
        table: "Track",
        columns: "FolderID",
    },
    Index {
        name: "TrackPathIndex",
        table: "Track",
        columns: "Path",
    },
];

fn migrate_11(conn: &Connection) -> rusqlite::Result<()> {
    for index in PLURAL_INDEXES {
        conn.execute_batch(&format!("DROP INDEX IF EXISTS {index};"))?;
    }
    for (old, new) in SINGULAR_NAMES {
        conn.execute_batch(&format!("ALTER TABLE {old} RENAME TO {new};"))?;
    }
    for index in SINGULAR_INDEXES {
        conn.execute_batch(&index.create_sql())?;
    }
    Ok(())
}

// Version 12: lower-cased paths for case-insensitive lookups.

fn migrate_12(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "ALTER TABLE Track ADD SafePath TEXT;
         UPDATE Track SET SafePath = LOWER(Path);
         CREATE INDEX TrackSafePathIndex ON Track(SafePath);
         ALTER TABLE Folder ADD SafePath TEXT;
         UPDATE Folder SET SafePath = LOWER(Path);
         ALTER TABLE RemovedTrack ADD SafePath TEXT;
         UPDATE RemovedTrack SET SafePath = LOWER(Path);
         ALTER TABLE QueuedTrack ADD SafePath TEXT;
         UPDATE QueuedTrack SET SafePath = LOWER(Path);",
    )
}

fn migrate_13(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "ALTER TABLE Track ADD Love INTEGER;
         UPDATE Track SET Love = 0;",
    )
}

fn migrate_14(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "ALTER TABLE QueuedTrack ADD IsPlaying INTEGER;
         ALTER TABLE QueuedTrack ADD ProgressSeconds INTEGER;",
    )
}

fn migrate_15(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "ALTER TABLE Track ADD HasLyrics INTEGER;
         ALTER TABLE Track ADD NeedsIndexing INTEGER;
         UPDATE Track SET HasLyrics = 0;
         UPDATE Track SET NeedsIndexing = 1;",
    )
}

// Version 16: play statistics are keyed by path so they survive a track
// being removed and re-indexed.

static TRACK_V16: TableShape = TableShape {
    name: "Track",
    columns: &[
        column("TrackID", "INTEGER"),
        column("ArtistID", "INTEGER"),
        column("GenreID", "INTEGER"),
        column("AlbumID", "INTEGER"),
        column("FolderID", "INTEGER"),
        column("Path", "TEXT"),
        column("SafePath", "TEXT"),
        column("FileName", "TEXT"),
        column("MimeType", "TEXT"),
        column("FileSize", "INTEGER"),
        column("BitRate", "INTEGER"),
        column("SampleRate", "INTEGER"),
        column("TrackTitle", "TEXT"),
        column("TrackNumber", "INTEGER"),
        column("TrackCount", "INTEGER"),
        column("DiscNumber", "INTEGER"),
        column("DiscCount", "INTEGER"),
        column("Duration", "INTEGER"),
        column("Year", "INTEGER"),
        column("HasLyrics", "INTEGER"),
        column("DateAdded", "INTEGER"),
        column("DateLastSynced", "INTEGER"),
        column("DateFileModified", "INTEGER"),
        column("MetaDataHash", "TEXT"),
        column("NeedsIndexing", "INTEGER"),
    ],
    primary_key: Some("TrackID"),
};

const TRACK_V16_INDEXES: &[Index] = &[
    Index {
        name: "TrackArtistIDIndex",
        table: "Track",
        columns: "ArtistID",
    },
    Index {
        name: "TrackAlbumIDIndex",
        table: "Track",
        columns: "AlbumID",
    },
    Index {
        name: "TrackGenreIDIndex",
        table: "Track",
        columns: "GenreID",
    },
    Index {
        name: "TrackFolderIDIndex",
        table: "Track",
        columns: "FolderID",
    },
    Index {
        name: "TrackPathIndex",
        table: "Track",
        columns: "Path",
    },
    Index {
        name: "TrackSafePathIndex",
        table: "Track",
        columns: "SafePath",
    },
];

fn migrate_16(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE TrackStatistic (
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
         INSERT INTO TrackStatistic (Path, SafePath, Rating, Love, PlayCount, SkipCount, DateLastPlayed)
             SELECT Path, SafePath, Rating, Love, PlayCount, SkipCount, DateLastPlayed FROM Track;",
    )?;
    Rebuild::new(&TRACK_V16)
        .with_indexes(TRACK_V16_INDEXES)
        .run(conn)
}

// Version 17: queue entries belong to a named queue; old entries are discarded.

fn migrate_17(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "DELETE FROM QueuedTrack;
         ALTER TABLE QueuedTrack ADD QueueID TEXT;",
    )
}

fn migrate_18(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "DROP TABLE Playlist;
         DROP TABLE PlaylistEntry;",
    )
}

// Version 19: DateAdded becomes the time the album entered the library; the
// old value is kept as DateCreated.

fn migrate_19(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "ALTER TABLE Album ADD DateCreated INTEGER;
         UPDATE Album SET DateCreated = DateAdded;",
    )?;
    conn.execute("UPDATE Album SET DateAdded = ?1", [ticks::now()])?;
    Ok(())
}
