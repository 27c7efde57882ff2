use std::sync::Arc;

use ppserver::db::Database;
use ppserver::models::*;
use ppserver::source::*;
use ppserver::store::*;
use speculate2::speculate;

fn table(names: &[&str]) -> RawTable {
    let mut grid = vec![vec!["Name".to_string()]];
    grid.extend(names.iter().map(|n| vec![n.to_string()]));
    RawTable::from_grid(grid)
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "table cache" {
        it "returns None for tables never cached" {
            assert!(db.get_cached_table("Characters").expect("Query failed").is_none());
            assert!(TableCache::get(&db, "Characters").expect("Query failed").is_none());
        }

        it "round-trips a table with its fetch time" {
            let before = chrono::Utc::now();
            db.put_cached_table("Characters", &table(&["Grak", "Elira"])).expect("Failed to cache");

            let cached = db.get_cached_table("Characters").expect("Query failed").expect("cached");
            assert_eq!(cached.name, "Characters");
            assert_eq!(cached.table, table(&["Grak", "Elira"]));
            assert!(cached.fetched_at >= before - chrono::Duration::seconds(1));
        }

        it "overwrites an existing entry" {
            db.put_cached_table("Characters", &table(&["Grak"])).unwrap();
            db.put_cached_table("Characters", &table(&["Bram"])).unwrap();

            let cached = TableCache::get(&db, "Characters").unwrap().unwrap();
            assert_eq!(cached, table(&["Bram"]));
            assert_eq!(db.cached_table_names().unwrap(), vec!["Characters"]);
        }

        it "invalidates only the named tables" {
            db.put_cached_table("Characters", &table(&["Grak"])).unwrap();
            db.put_cached_table("Relations", &table(&[])).unwrap();
            db.put_cached_table("Other", &table(&[])).unwrap();

            let removed = db
                .delete_cached_tables(&["Characters".to_string(), "Relations".to_string()])
                .unwrap();

            assert_eq!(removed, 2);
            assert_eq!(db.cached_table_names().unwrap(), vec!["Other"]);
        }

        it "clears everything" {
            db.put_cached_table("Characters", &table(&["Grak"])).unwrap();
            db.put_cached_table("Relations", &table(&[])).unwrap();

            assert_eq!(db.clear_cache().unwrap(), 2);
            assert!(db.cached_table_names().unwrap().is_empty());
        }

        it "migrations can run twice" {
            db.migrate().expect("second migration run is a no-op");
        }
    }

    describe "directory source behind the cache" {
        before {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(
                dir.path().join("relations.json"),
                r#"[["Actor","Relation","Target","Extra"],["Grak","hates","Elira","bi,?"]]"#,
            ).unwrap();
            std::fs::write(
                dir.path().join("characters.json"),
                r#"[["Name","Description","Keywords"],["Grak","A \"big\" orc","dead"],["Elira","Ranger","player"]]"#,
            ).unwrap();
            let store = CampaignStore::new(
                Arc::new(DirectorySource::new(dir.path())),
                Arc::new(db.clone()),
                TableNames::new("relations", "characters"),
            );
        }

        it "writes fetched tables to the cache" {
            tokio_test::block_on(store.reload(false)).expect("load succeeds");

            assert_eq!(db.cached_table_names().unwrap(), vec!["characters", "relations"]);
            assert_eq!(store.person_count(), 2);
        }

        it "prefers cached tables over the files until forced" {
            tokio_test::block_on(store.reload(false)).unwrap();
            std::fs::write(dir.path().join("characters.json"), r#"[["Name"],["Bram"]]"#).unwrap();

            tokio_test::block_on(store.reload(false)).unwrap();
            assert_eq!(store.person_count(), 2);

            tokio_test::block_on(store.reload(true)).unwrap();
            assert_eq!(store.person_count(), 1);
            assert!(store.roster_html().contains("<td>Bram</td>"));
        }

        it "reports a missing file as a missing table" {
            std::fs::remove_file(dir.path().join("relations.json")).unwrap();

            let err = tokio_test::block_on(store.reload(false)).unwrap_err();
            assert!(matches!(err, SourceError::MissingTable(name) if name == "relations"));
            assert_eq!(store.state(), StoreState::Empty);
        }
    }
}
