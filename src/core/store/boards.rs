//! Board metadata operations

use chrono::Utc;
use miette::{IntoDiagnostic, Result};
use rusqlite::{params, OptionalExtension, Row};

use super::{format_datetime, parse_datetime, DocumentStore};
use crate::core::board::{Board, BoardFiles, BoardInfo, BoardSelector, TableKind};

fn board_from_row(row: &Row<'_>) -> rusqlite::Result<Board> {
    Ok(Board {
        id: row.get(0)?,
        name: row.get(1)?,
        image_url: row.get(2)?,
        created_at: parse_datetime(row.get::<_, String>(3)?),
    })
}

impl DocumentStore {
    /// Register a new board
    pub fn add_board(&self, name: &str, image_url: Option<&str>) -> Result<Board> {
        let name = name.trim();
        if name.is_empty() {
            return Err(miette::miette!("Board name must not be empty"));
        }
        if self.find_board(&BoardSelector::Name(name.to_string()))?.is_some() {
            return Err(miette::miette!("Board '{}' already exists", name));
        }

        let now = Utc::now();
        self.conn
            .execute(
                "INSERT INTO boards (name, image_url, created_at) VALUES (?1, ?2, ?3)",
                params![name, image_url, format_datetime(&now)],
            )
            .into_diagnostic()?;

        Ok(Board {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            image_url: image_url.map(String::from),
            created_at: now,
        })
    }

    /// All boards, ordered by id
    pub fn list_boards(&self) -> Result<Vec<Board>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, image_url, created_at FROM boards ORDER BY id")
            .into_diagnostic()?;
        let boards = stmt
            .query_map([], board_from_row)
            .into_diagnostic()?
            .collect::<rusqlite::Result<Vec<_>>>()
            .into_diagnostic()?;
        Ok(boards)
    }

    /// Look a board up by id or (case-insensitive) name
    pub fn find_board(&self, selector: &BoardSelector) -> Result<Option<Board>> {
        let board = match selector {
            BoardSelector::Id(id) => self
                .conn
                .query_row(
                    "SELECT id, name, image_url, created_at FROM boards WHERE id = ?1",
                    params![id],
                    board_from_row,
                )
                .optional(),
            BoardSelector::Name(name) => self
                .conn
                .query_row(
                    "SELECT id, name, image_url, created_at FROM boards WHERE name = ?1",
                    params![name],
                    board_from_row,
                )
                .optional(),
        };
        board.into_diagnostic()
    }

    /// Like [`find_board`](Self::find_board) but a missing board is an error
    pub fn require_board(&self, selector: &BoardSelector) -> Result<Board> {
        self.find_board(selector)?
            .ok_or_else(|| miette::miette!("Board not found: {}", selector))
    }

    /// Delete a board together with its uploaded sheets
    pub fn remove_board(&self, id: i64) -> Result<bool> {
        self.conn
            .execute("DELETE FROM table_documents WHERE board_id = ?1", params![id])
            .into_diagnostic()?;
        let removed = self
            .conn
            .execute("DELETE FROM boards WHERE id = ?1", params![id])
            .into_diagnostic()?;
        Ok(removed > 0)
    }

    /// Board listing with upload availability
    pub fn board_infos(&self) -> Result<Vec<BoardInfo>> {
        let mut infos = Vec::new();
        for board in self.list_boards()? {
            let has_fmeca = self.has_table(board.id, TableKind::Fmeca)?;
            let has_coverage = self.has_table(board.id, TableKind::Coverage)?;
            infos.push(BoardInfo {
                id: board.id,
                has_image: board.image_url.is_some(),
                image: board.image_url,
                name: board.name,
                has_fmeca,
                has_coverage,
            });
        }
        Ok(infos)
    }

    /// Sheet and image availability for one board
    pub fn board_files(&self, board: &Board) -> Result<BoardFiles> {
        Ok(BoardFiles {
            board_id: board.id,
            board_name: board.name.clone(),
            fmeca_exists: self.has_table(board.id, TableKind::Fmeca)?,
            coverage_exists: self.has_table(board.id, TableKind::Coverage)?,
            image_exists: board.image_url.is_some(),
        })
    }

    /// Set or clear a board's image URL; returns false if the board is unknown
    pub fn set_board_image(&self, id: i64, image_url: Option<&str>) -> Result<bool> {
        let updated = self
            .conn
            .execute(
                "UPDATE boards SET image_url = ?2 WHERE id = ?1",
                params![id, image_url],
            )
            .into_diagnostic()?;
        Ok(updated > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_find_board() {
        let store = DocumentStore::open_in_memory().unwrap();
        let imd = store.add_board("IMD", Some("https://img.example/imd.png")).unwrap();
        store.add_board("SCR", None).unwrap();

        let by_id = store.find_board(&BoardSelector::Id(imd.id)).unwrap().unwrap();
        assert_eq!(by_id.name, "IMD");

        let by_name = store
            .find_board(&BoardSelector::Name("imd".into()))
            .unwrap()
            .unwrap();
        assert_eq!(by_name.id, imd.id);

        assert!(store.find_board(&BoardSelector::Id(99)).unwrap().is_none());
        assert_eq!(store.list_boards().unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_board_rejected() {
        let store = DocumentStore::open_in_memory().unwrap();
        store.add_board("IMD", None).unwrap();
        assert!(store.add_board("imd", None).is_err());
        assert!(store.add_board("  ", None).is_err());
    }

    #[test]
    fn test_board_infos_reflect_image() {
        let store = DocumentStore::open_in_memory().unwrap();
        store.add_board("IMD", Some("https://img.example/imd.png")).unwrap();
        store.add_board("SCR", None).unwrap();

        let infos = store.board_infos().unwrap();
        assert!(infos[0].has_image);
        assert!(!infos[1].has_image);
        assert!(!infos[0].has_fmeca);
        assert!(!infos[0].has_coverage);
    }

    #[test]
    fn test_set_board_image() {
        let store = DocumentStore::open_in_memory().unwrap();
        let board = store.add_board("IMD", None).unwrap();

        assert!(store
            .set_board_image(board.id, Some("https://img.example/imd.png"))
            .unwrap());
        let board = store.require_board(&BoardSelector::Id(board.id)).unwrap();
        assert!(store.board_files(&board).unwrap().image_exists);

        assert!(!store.set_board_image(42, None).unwrap());
    }
}
