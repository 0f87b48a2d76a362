use anyhow::{bail, Context, Result};
use log::debug;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};

use super::adapter::{
    AliasRecord, EncodingPolicy, EventRecord, GameRecord, PlayerRecord, Record, RecordFile, RecordList,
    ResultsStore,
};
use super::setup;
use crate::domain::EventIdentity;

type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

/// One pooled connection with foreign keys enforced.
fn connect(database_path: &str) -> Result<DbConn> {
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .build(manager)
        .context("Failed to create database connection pool")?;
    pool.get().context("Failed to get database connection from pool")
}

/// Results store in one SQLite database file.
pub struct SqliteStore {
    conn: DbConn,
    encoding: EncodingPolicy,
    in_transaction: bool,
}

impl SqliteStore {
    pub fn open(database_path: &str, encoding: EncodingPolicy) -> Result<Self> {
        let conn = connect(database_path)?;
        setup::ensure_schema(&conn)?;
        debug!("Opened results store {}", database_path);
        Ok(Self {
            conn,
            encoding,
            in_transaction: false,
        })
    }

    fn ids(&mut self, file: RecordFile, sql: &str, key: impl rusqlite::ToSql) -> Result<RecordList> {
        let mut stmt = self.conn.prepare(sql)?;
        let ids = stmt
            .query_map(params![key], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(RecordList { file, ids })
    }
}

fn parse_event_row(row: &rusqlite::Row) -> rusqlite::Result<EventRecord> {
    Ok(EventRecord {
        name: row.get(0)?,
        start_date: row.get(1)?,
        end_date: row.get(2)?,
    })
}

fn parse_player_row(row: &rusqlite::Row) -> rusqlite::Result<PlayerRecord> {
    Ok(PlayerRecord {
        event_id: row.get(0)?,
        name: row.get(1)?,
        club: row.get(2)?,
        section: row.get(3)?,
        pin: row.get(4)?,
        affiliation: row.get(5)?,
        codes: row.get(6)?,
    })
}

fn parse_game_row(row: &rusqlite::Row) -> rusqlite::Result<GameRecord> {
    Ok(GameRecord {
        event_id: row.get(0)?,
        section: row.get(1)?,
        competition: row.get(2)?,
        home_team: row.get(3)?,
        away_team: row.get(4)?,
        board: row.get(5)?,
        round: row.get(6)?,
        date: row.get(7)?,
        home_player_id: row.get(8)?,
        away_player_id: row.get(9)?,
        result: row.get(10)?,
        home_player_white: row.get(11)?,
        grading_only: row.get(12)?,
        source: row.get(13)?,
    })
}

fn parse_alias_row(row: &rusqlite::Row) -> rusqlite::Result<AliasRecord> {
    Ok(AliasRecord {
        event_id: row.get(0)?,
        kind: row.get(1)?,
        alias: row.get(2)?,
        value: row.get(3)?,
    })
}

const EVENT_COLUMNS: &str = "name, start_date, end_date";
const PLAYER_COLUMNS: &str = "event_id, name, club, section, pin, affiliation, codes";
const GAME_COLUMNS: &str = "event_id, section, competition, home_team, away_team, board, round, date, \
     home_player_id, away_player_id, result, home_player_white, grading_only, source";
const ALIAS_COLUMNS: &str = "event_id, kind, alias, value";

impl ResultsStore for SqliteStore {
    fn start_transaction(&mut self) -> Result<()> {
        if self.in_transaction {
            bail!("A transaction is already in progress");
        }
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .context("Failed to start transaction")?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT").context("Failed to commit transaction")?;
        self.in_transaction = false;
        Ok(())
    }

    fn backout(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        self.conn
            .execute_batch("ROLLBACK")
            .context("Failed to roll back transaction")
    }

    fn get_primary_record(&mut self, file: RecordFile, id: i64) -> Result<Option<Record>> {
        let record = match file {
            RecordFile::Event => {
                let sql = format!("SELECT {} FROM events WHERE id = ?1", EVENT_COLUMNS);
                self.conn.query_row(&sql, params![id], parse_event_row).optional()?.map(Record::Event)
            }
            RecordFile::Player => {
                let sql = format!("SELECT {} FROM players WHERE id = ?1", PLAYER_COLUMNS);
                self.conn.query_row(&sql, params![id], parse_player_row).optional()?.map(Record::Player)
            }
            RecordFile::Game => {
                let sql = format!("SELECT {} FROM games WHERE id = ?1", GAME_COLUMNS);
                self.conn.query_row(&sql, params![id], parse_game_row).optional()?.map(Record::Game)
            }
            RecordFile::Alias => {
                let sql = format!("SELECT {} FROM aliases WHERE id = ?1", ALIAS_COLUMNS);
                self.conn.query_row(&sql, params![id], parse_alias_row).optional()?.map(Record::Alias)
            }
        };
        Ok(record)
    }

    fn get_events_matching_event_identity(&mut self, identity: &EventIdentity) -> Result<RecordList> {
        let sql = "SELECT id FROM events WHERE name_key = ?1 AND start_date = ?2 AND end_date = ?3 ORDER BY id";
        let name_key = self.encoding.key(&identity.name);
        let mut stmt = self.conn.prepare(sql)?;
        let ids = stmt
            .query_map(params![name_key, identity.start_date, identity.end_date], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()
            .context("Failed to query events by identity")?;
        Ok(RecordList {
            file: RecordFile::Event,
            ids,
        })
    }

    fn get_aliases_for_event(&mut self, event_id: i64) -> Result<RecordList> {
        self.ids(RecordFile::Alias, "SELECT id FROM aliases WHERE event_id = ?1 ORDER BY id", event_id)
            .context("Failed to query aliases for event")
    }

    fn get_games_for_event(&mut self, event_id: i64) -> Result<RecordList> {
        self.ids(RecordFile::Game, "SELECT id FROM games WHERE event_id = ?1 ORDER BY id", event_id)
            .context("Failed to query games for event")
    }

    fn database_cursor(&mut self, file: RecordFile, field: &str) -> Result<Vec<(String, i64)>> {
        if !file.indexed_fields().contains(&field) {
            bail!("{} has no index on {}", file.table(), field);
        }
        let sql = format!(
            "SELECT COALESCE(CAST({field} AS TEXT), ''), id FROM {table} ORDER BY {field}, id",
            field = field,
            table = file.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn put_record(&mut self, record: &Record) -> Result<i64> {
        match record {
            Record::Event(event) => {
                self.conn.execute(
                    "INSERT INTO events (name, name_key, start_date, end_date) VALUES (?1, ?2, ?3, ?4)",
                    params![event.name, self.encoding.key(&event.name), event.start_date, event.end_date],
                )
            }
            Record::Player(player) => self.conn.execute(
                "INSERT INTO players (event_id, name, name_key, club, section, pin, affiliation, codes) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    player.event_id,
                    player.name,
                    self.encoding.key(&player.name),
                    player.club,
                    player.section,
                    player.pin,
                    player.affiliation,
                    player.codes
                ],
            ),
            Record::Game(game) => self.conn.execute(
                "INSERT INTO games (event_id, section, competition, home_team, away_team, board, round, date, \
                 home_player_id, away_player_id, result, home_player_white, grading_only, source) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    game.event_id,
                    game.section,
                    game.competition,
                    game.home_team,
                    game.away_team,
                    game.board,
                    game.round,
                    game.date,
                    game.home_player_id,
                    game.away_player_id,
                    game.result,
                    game.home_player_white,
                    game.grading_only,
                    game.source
                ],
            ),
            Record::Alias(alias) => self.conn.execute(
                "INSERT INTO aliases (event_id, kind, alias, alias_key, value) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![alias.event_id, alias.kind, alias.alias, self.encoding.key(&alias.alias), alias.value],
            ),
        }
        .with_context(|| format!("Failed to insert into {}", record.file().table()))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn edit_record(&mut self, id: i64, record: &Record) -> Result<()> {
        let changed = match record {
            Record::Event(event) => self.conn.execute(
                "UPDATE events SET name = ?1, name_key = ?2, start_date = ?3, end_date = ?4 WHERE id = ?5",
                params![event.name, self.encoding.key(&event.name), event.start_date, event.end_date, id],
            ),
            Record::Player(player) => self.conn.execute(
                "UPDATE players SET name = ?1, name_key = ?2, club = ?3, section = ?4, pin = ?5, \
                 affiliation = ?6, codes = ?7 WHERE id = ?8",
                params![
                    player.name,
                    self.encoding.key(&player.name),
                    player.club,
                    player.section,
                    player.pin,
                    player.affiliation,
                    player.codes,
                    id
                ],
            ),
            Record::Game(game) => self.conn.execute(
                "UPDATE games SET result = ?1, date = ?2, home_player_white = ?3, grading_only = ?4 WHERE id = ?5",
                params![game.result, game.date, game.home_player_white, game.grading_only, id],
            ),
            Record::Alias(alias) => self.conn.execute(
                "UPDATE aliases SET kind = ?1, alias = ?2, alias_key = ?3, value = ?4 WHERE id = ?5",
                params![alias.kind, alias.alias, self.encoding.key(&alias.alias), alias.value, id],
            ),
        }
        .with_context(|| format!("Failed to update {} record {}", record.file().table(), id))?;
        if changed == 0 {
            bail!("No {} record {}", record.file().table(), id);
        }
        Ok(())
    }

    fn delete_record(&mut self, file: RecordFile, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", file.table());
        self.conn
            .execute(&sql, params![id])
            .with_context(|| format!("Failed to delete {} record {}", file.table(), id))?;
        Ok(())
    }

    fn encoding(&self) -> EncodingPolicy {
        self.encoding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn store() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.db");
        let store = SqliteStore::open(path.to_str().unwrap(), EncodingPolicy::Utf8).unwrap();
        (dir, store)
    }

    fn identity() -> EventIdentity {
        EventIdentity {
            name: "My League 2024".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        }
    }

    #[test]
    fn test_put_and_find_event() {
        let (_dir, mut store) = store();
        let id = store.put_record(&Record::Event(EventRecord::from(&identity()))).unwrap();

        let mut shouting = identity();
        shouting.name = "MY  LEAGUE 2024".to_string();
        let found = store.get_events_matching_event_identity(&shouting).unwrap();
        assert_eq!(found.ids, vec![id]);

        let record = store.get_primary_record(RecordFile::Event, id).unwrap();
        assert_eq!(record, Some(Record::Event(EventRecord::from(&identity()))));
        assert!(store.get_primary_record(RecordFile::Event, id + 1).unwrap().is_none());
    }

    #[test]
    fn test_backout_discards_writes() {
        let (_dir, mut store) = store();
        store.start_transaction().unwrap();
        store.put_record(&Record::Event(EventRecord::from(&identity()))).unwrap();
        store.backout().unwrap();
        assert!(store.get_events_matching_event_identity(&identity()).unwrap().is_empty());
    }

    #[test]
    fn test_games_cursor_and_cascade() {
        let (_dir, mut store) = store();
        let event_id = store.put_record(&Record::Event(EventRecord::from(&identity()))).unwrap();
        let player = PlayerRecord {
            event_id,
            name: "Smith".to_string(),
            club: Some("Toytown".to_string()),
            section: None,
            pin: None,
            affiliation: Some("Toytown".to_string()),
            codes: "123A".to_string(),
        };
        let smith = store.put_record(&Record::Player(player)).unwrap();
        let game = GameRecord {
            event_id,
            section: "Division 1".to_string(),
            competition: Some("Division 1".to_string()),
            home_team: Some("Toytown A".to_string()),
            away_team: Some("Anytown B".to_string()),
            board: Some("1".to_string()),
            round: None,
            date: NaiveDate::from_ymd_opt(2024, 10, 5),
            home_player_id: Some(smith),
            away_player_id: None,
            result: "1-0".to_string(),
            home_player_white: Some(false),
            grading_only: false,
            source: Some("email1".to_string()),
        };
        let game_id = store.put_record(&Record::Game(game.clone())).unwrap();
        assert_eq!(store.get_games_for_event(event_id).unwrap().ids, vec![game_id]);

        let drawn = GameRecord {
            result: "draw".to_string(),
            ..game
        };
        store.edit_record(game_id, &Record::Game(drawn.clone())).unwrap();
        assert_eq!(
            store.get_primary_record(RecordFile::Game, game_id).unwrap(),
            Some(Record::Game(drawn))
        );

        let cursor = store.database_cursor(RecordFile::Player, "name_key").unwrap();
        assert_eq!(cursor, vec![("smith".to_string(), smith)]);
        assert!(store.database_cursor(RecordFile::Player, "codes").is_err());

        store.delete_record(RecordFile::Event, event_id).unwrap();
        assert!(store.get_games_for_event(event_id).unwrap().is_empty());
        assert!(store.get_primary_record(RecordFile::Player, smith).unwrap().is_none());
    }
}
