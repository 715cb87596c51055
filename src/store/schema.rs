use rusqlite::Connection;

/// Idempotent schema creation. There are no destructive migrations; regions
/// and players are append-only.
pub fn create_all(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS regions (
            id                INTEGER PRIMARY KEY,
            name              TEXT NOT NULL UNIQUE,
            srname            TEXT NOT NULL,
            owner             INTEGER,
            capital           INTEGER,
            eternal           INTEGER NOT NULL DEFAULT 0,
            travel_multiplier REAL NOT NULL DEFAULT 1.0
        );

        CREATE TABLE IF NOT EXISTS borders (
            a INTEGER NOT NULL REFERENCES regions(id),
            b INTEGER NOT NULL REFERENCES regions(id),
            PRIMARY KEY (a, b)
        ) WITHOUT ROWID;

        CREATE TABLE IF NOT EXISTS aliases (
            name      TEXT PRIMARY KEY,
            region_id INTEGER NOT NULL REFERENCES regions(id)
        ) WITHOUT ROWID;

        CREATE TABLE IF NOT EXISTS players (
            id         INTEGER PRIMARY KEY,
            name       TEXT NOT NULL UNIQUE,
            team       INTEGER NOT NULL,
            loyalists  INTEGER NOT NULL,
            committed  INTEGER NOT NULL DEFAULT 0,
            region_id  INTEGER NOT NULL REFERENCES regions(id),
            sector     INTEGER NOT NULL DEFAULT 0,
            leader     INTEGER NOT NULL DEFAULT 0,
            defectable INTEGER NOT NULL DEFAULT 1,
            recruited  INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS marching_orders (
            id          INTEGER PRIMARY KEY,
            leader_id   INTEGER NOT NULL REFERENCES players(id),
            source_id   INTEGER NOT NULL REFERENCES regions(id),
            dest_id     INTEGER NOT NULL REFERENCES regions(id),
            dest_sector INTEGER NOT NULL DEFAULT 0,
            arrival     INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_marching_leader
            ON marching_orders(leader_id, arrival);

        CREATE TABLE IF NOT EXISTS battles (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            region_id     INTEGER NOT NULL REFERENCES regions(id),
            begins        INTEGER NOT NULL,
            display_ends  INTEGER,
            ends          INTEGER,
            submission_id TEXT,
            lockout       INTEGER NOT NULL DEFAULT 0,
            score0        INTEGER,
            score1        INTEGER,
            victor        INTEGER
        );

        CREATE TABLE IF NOT EXISTS skirmishes (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            battle_id    INTEGER NOT NULL REFERENCES battles(id) ON DELETE CASCADE,
            parent_id    INTEGER REFERENCES skirmishes(id) ON DELETE CASCADE,
            player_id    INTEGER NOT NULL REFERENCES players(id),
            team         INTEGER NOT NULL,
            amount       INTEGER NOT NULL,
            troops       TEXT NOT NULL,
            hinder       INTEGER NOT NULL DEFAULT 1,
            sector       INTEGER NOT NULL DEFAULT 0,
            ends         INTEGER,
            display_ends INTEGER,
            comment_id   TEXT,
            resolved     INTEGER NOT NULL DEFAULT 0,
            victor       INTEGER,
            margin       INTEGER NOT NULL DEFAULT 0,
            vp           INTEGER NOT NULL DEFAULT 0,
            unopposed    INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_skirmish_battle ON skirmishes(battle_id);
        CREATE INDEX IF NOT EXISTS idx_skirmish_player ON skirmishes(player_id, resolved);

        CREATE TABLE IF NOT EXISTS buffs (
            id          INTEGER PRIMARY KEY,
            name        TEXT NOT NULL,
            internal    TEXT NOT NULL,
            value       REAL NOT NULL DEFAULT 0,
            expires     INTEGER,
            region_id   INTEGER REFERENCES regions(id),
            skirmish_id INTEGER REFERENCES skirmishes(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS codewords (
            player_id INTEGER NOT NULL REFERENCES players(id),
            code      TEXT NOT NULL,
            word      TEXT NOT NULL,
            PRIMARY KEY (player_id, code)
        ) WITHOUT ROWID;

        CREATE TABLE IF NOT EXISTS processed (
            battle_id  INTEGER NOT NULL REFERENCES battles(id) ON DELETE CASCADE,
            message_id TEXT NOT NULL,
            PRIMARY KEY (battle_id, message_id)
        ) WITHOUT ROWID;
        ",
    )
}
