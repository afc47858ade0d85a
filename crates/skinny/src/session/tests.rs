use super::*;
use crate::expr::{field, gt, lt};
use crate::schema::{FieldDef, FieldType};
use crate::store::mock::{Call, MockStore};
use crate::value::FromValue;
use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: i64,
    name: String,
    age: i64,
    birth: NaiveDateTime,
    percentage: f64,
}

static USER_SCHEMA: Schema = Schema::new(
    "User",
    &[
        FieldDef::new("id", FieldType::Integer),
        FieldDef::new("name", FieldType::Text),
        FieldDef::new("age", FieldType::Integer),
        FieldDef::new("birth", FieldType::Timestamp),
        FieldDef::new("percentage", FieldType::Real),
    ],
);

impl Entity for User {
    fn schema() -> &'static Schema {
        &USER_SCHEMA
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.name.clone().into(),
            self.age.into(),
            self.birth.into(),
            self.percentage.into(),
        ]
    }

    fn from_values(values: Vec<Value>) -> OrmResult<Self> {
        crate::schema::expect_arity(Self::schema(), &values)?;
        let mut it = values.into_iter();
        let mut next = |col: &str| it.next().ok_or_else(|| OrmError::decode(col, "missing"));
        Ok(Self {
            id: FromValue::from_value(next("id")?, "id")?,
            name: FromValue::from_value(next("name")?, "name")?,
            age: FromValue::from_value(next("age")?, "age")?,
            birth: FromValue::from_value(next("birth")?, "birth")?,
            percentage: FromValue::from_value(next("percentage")?, "percentage")?,
        })
    }
}

struct Nothing;

static NOTHING_SCHEMA: Schema = Schema::new("Nothing", &[]);

impl Entity for Nothing {
    fn schema() -> &'static Schema {
        &NOTHING_SCHEMA
    }

    fn to_values(&self) -> Vec<Value> {
        Vec::new()
    }

    fn from_values(_values: Vec<Value>) -> OrmResult<Self> {
        Ok(Nothing)
    }
}

const SELECT_USER: &str =
    "select User.id, User.name, User.age, User.birth, User.percentage from User";

fn birth() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1990, 7, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn user(id: i64, name: &str) -> User {
    User {
        id,
        name: name.to_string(),
        age: 13,
        birth: birth(),
        percentage: 0.99,
    }
}

fn raw_row(id: i64, name: &str) -> Vec<Value> {
    vec![
        Value::Integer(id),
        Value::from(name),
        Value::Integer(13),
        Value::from("1990-07-01 12:00:00"),
        Value::Real(0.99),
    ]
}

fn orm() -> Orm<MockStore> {
    Orm::new(MockStore::with_tables(&["User"]))
}

#[test]
fn select_all_marshals_rows() {
    let mut orm = orm();
    orm.store_mut()
        .queue_rows(vec![raw_row(1, "Naruto"), raw_row(2, "Sasuke")]);

    let users = orm.select::<User>().unwrap().all().unwrap();

    assert_eq!(users, vec![user(1, "Naruto"), user(2, "Sasuke")]);
    assert_eq!(orm.current_sql(), SELECT_USER);
    assert_eq!(
        orm.store().statements(),
        vec![&Call::FetchAll(SELECT_USER.to_string(), vec![])]
    );
    assert_eq!(orm.phase(), Phase::Executed);
}

#[test]
fn where_and_renders_in_order() {
    let mut orm = orm();
    let users = orm
        .select::<User>()
        .unwrap()
        .where_(gt("id", 5).and(lt("age", 7)))
        .unwrap()
        .all()
        .unwrap();

    assert!(users.is_empty());
    assert_eq!(
        orm.current_sql(),
        format!("{SELECT_USER} where User.id > ? and User.age < ? ")
    );
    assert_eq!(orm.current_params(), &[Value::from(5), Value::from(7)]);
}

#[test]
fn first_returns_none_without_rows() {
    let mut orm = orm();
    let found = orm
        .select::<User>()
        .unwrap()
        .where_(field("name").eq("I don't exist"))
        .unwrap()
        .first()
        .unwrap();
    assert!(found.is_none());
}

#[test]
fn limit_appends_cap_and_fetches() {
    let mut orm = orm();
    orm.store_mut().queue_rows(vec![raw_row(1, "Naruto")]);
    let users = orm.select::<User>().unwrap().limit(5).unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(orm.current_sql(), format!("{SELECT_USER} limit 5"));
}

#[test]
fn limit_rejects_out_of_range() {
    let mut orm = orm();
    let err = orm.select::<User>().unwrap().limit(u64::MAX).unwrap_err();
    assert!(matches!(err, OrmError::InvalidLimit(_)));

    let err = orm.select::<User>().unwrap().limit(-1).unwrap_err();
    assert!(matches!(err, OrmError::InvalidLimit(_)));
    assert!(orm.store().calls.is_empty());
}

#[test]
fn invalid_entity_fails_before_store() {
    let mut orm = orm();
    assert!(orm.select::<Nothing>().err().unwrap().is_invalid_entity());
    assert!(orm.delete::<Nothing>().err().unwrap().is_invalid_entity());
    assert!(orm.update::<Nothing>().err().unwrap().is_invalid_entity());
    assert!(orm.store().calls.is_empty());
}

#[test]
fn insert_commits_by_default() {
    let mut orm = orm();
    orm.insert(&user(9001, "Goku")).unwrap();

    let sql = "INSERT INTO User (id, name, age, birth, percentage) VALUES (?, ?, ?, ?, ?)";
    assert_eq!(
        orm.store().statements(),
        vec![
            &Call::Execute(sql.to_string(), user(9001, "Goku").to_values()),
            &Call::Commit,
        ]
    );
}

#[test]
fn insert_without_commit() {
    let mut orm = orm();
    orm.insert_with(&user(1, "Naruto"), false).unwrap();
    assert!(!orm.store().calls.contains(&Call::Commit));
}

#[test]
fn missing_table_is_created_and_retried_once() {
    let mut orm = Orm::new(MockStore::default());
    orm.insert(&user(1, "Naruto")).unwrap();

    let statements = orm.store().statements();
    assert_eq!(statements.len(), 4);
    assert!(matches!(statements[0], Call::Execute(sql, _) if sql.starts_with("INSERT")));
    assert!(matches!(statements[1], Call::Execute(sql, _) if sql.starts_with("CREATE TABLE \"User\"")));
    assert!(matches!(statements[2], Call::Execute(sql, _) if sql.starts_with("INSERT")));
    assert_eq!(statements[3], &Call::Commit);
    assert_eq!(orm.store().opened(), orm.store().closed());
}

#[test]
fn retry_is_bounded_when_create_has_no_effect() {
    let mut store = MockStore::default();
    store.ignore_create = true;
    let mut orm = Orm::new(store);

    let err = orm.select::<User>().unwrap().all().unwrap_err();

    assert!(err.is_missing_relation());
    let creates = orm
        .store()
        .statements()
        .into_iter()
        .filter(|c| matches!(c, Call::Execute(sql, _) if sql.starts_with("CREATE")))
        .count();
    assert_eq!(creates, 1);
    assert_eq!(orm.store().opened(), 2);
    assert_eq!(orm.store().opened(), orm.store().closed());
}

#[test]
fn missing_table_propagates_when_auto_create_disabled() {
    let config = OrmConfig::new().create_tables_if_not_exists(false);
    let mut orm = Orm::with_config(MockStore::default(), config);

    let err = orm.insert(&user(1, "Naruto")).unwrap_err();
    assert!(err.is_missing_relation());

    let err = orm.select::<User>().unwrap().first().unwrap_err();
    assert!(err.is_missing_relation());
    assert_eq!(orm.store().opened(), orm.store().closed());
}

#[test]
fn select_on_missing_table_yields_empty() {
    let mut orm = Orm::new(MockStore::default());
    assert!(orm.select::<User>().unwrap().all().unwrap().is_empty());
    assert!(orm.select::<User>().unwrap().first().unwrap().is_none());
    assert!(orm.store().tables.contains("User"));
}

#[test]
fn bulk_insert_empty_touches_nothing() {
    let mut orm = orm();
    orm.bulk_insert::<User>(&[]).unwrap();
    assert!(orm.store().calls.is_empty());
}

#[test]
fn bulk_insert_is_one_batch() {
    let mut orm = orm();
    let users = vec![user(1, "Naruto"), user(2, "Sasuke")];
    orm.bulk_insert(&users).unwrap();

    let statements = orm.store().statements();
    assert_eq!(statements.len(), 2);
    match statements[0] {
        Call::ExecuteMany(_, rows) => {
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[1], users[1].to_values());
        }
        other => panic!("unexpected call: {other:?}"),
    }
}

#[test]
fn set_accumulates() {
    let mut orm = orm();
    let query = orm
        .update::<User>()
        .unwrap()
        .set(field("name").eq("Hello World"))
        .unwrap()
        .set(field("percentage").eq(5.5))
        .unwrap();
    drop(query);

    assert_eq!(orm.current_set(), "set name = ? , percentage = ? ");
    assert_eq!(
        orm.current_params(),
        &[Value::from("Hello World"), Value::from(5.5)]
    );
    assert!(orm.store().calls.is_empty());
}

#[test]
fn set_rejects_non_equality_before_store() {
    let mut orm = orm();
    let err = orm
        .update::<User>()
        .unwrap()
        .set(field("id").gt(2))
        .err()
        .unwrap();
    assert!(matches!(err, OrmError::InvalidSetComparator(">")));
    assert!(orm.store().calls.is_empty());
}

#[test]
fn update_where_executes_and_commits() {
    let mut orm = orm();
    let query = orm
        .update::<User>()
        .unwrap()
        .set(field("name").eq("Hello World"))
        .unwrap()
        .where_(field("id").lt(5))
        .unwrap();

    assert!(matches!(query.all(), Err(OrmError::AlreadyExecuted)));
    let sql = "update User set name = ? where User.id < ? ";
    assert_eq!(
        orm.store().statements(),
        vec![
            &Call::Execute(
                sql.to_string(),
                vec![Value::from("Hello World"), Value::from(5)]
            ),
            &Call::Commit,
        ]
    );
}

#[test]
fn update_without_set_is_rejected() {
    let mut orm = orm();
    let err = orm
        .update::<User>()
        .unwrap()
        .where_(field("id").eq(1))
        .err()
        .unwrap();
    assert!(matches!(err, OrmError::EmptySet(_)));
    assert!(orm.store().calls.is_empty());
}

#[test]
fn delete_where_executes_immediately() {
    let mut orm = orm();
    orm.delete::<User>()
        .unwrap()
        .where_(field("id").eq(9001))
        .unwrap();

    assert_eq!(
        orm.store().statements(),
        vec![
            &Call::Execute(
                "delete from User where User.id = ? ".to_string(),
                vec![Value::from(9001)]
            ),
            &Call::Commit,
        ]
    );
}

#[test]
fn delete_all_with_commit() {
    let mut orm = orm();
    let out = orm.delete::<User>().unwrap().all_with(true).unwrap();
    assert!(out.is_empty());
    assert_eq!(
        orm.store().statements(),
        vec![
            &Call::Execute("delete from User".to_string(), vec![]),
            &Call::Commit,
        ]
    );
}

#[test]
fn using_single_record_flattens_params() {
    let mut orm = orm();
    let mut record = user(1, "Hello World");
    record.name = "Mr. Hello World".to_string();
    orm.update_record(&record)
        .unwrap()
        .using([field("id")])
        .unwrap();

    let mut expected = record.to_values();
    expected.push(Value::from(1));
    assert_eq!(
        orm.store().statements(),
        vec![
            &Call::Execute(
                "update User set id = ?, name = ?, age = ?, birth = ?, percentage = ? where id = ?"
                    .to_string(),
                expected
            ),
            &Call::Commit,
        ]
    );
}

#[test]
fn bulk_update_batches_rows() {
    let mut orm = orm();
    let users = vec![user(1, "Naruto"), user(2, "Sasuke"), user(3, "Sakura")];
    orm.bulk_update(&users).unwrap().using(["id"]).unwrap();

    assert_eq!(orm.current_batch().len(), 3);
    match orm.store().statements()[0] {
        Call::ExecuteMany(_, rows) => {
            assert_eq!(rows.len(), 3);
            assert_eq!(rows[2].last(), Some(&Value::from(3)));
        }
        other => panic!("unexpected call: {other:?}"),
    }
}

#[test]
fn using_requires_pending_records() {
    let mut orm = orm();
    let err = orm.update::<User>().unwrap().using(["id"]).unwrap_err();
    assert!(matches!(err, OrmError::NoPendingRecords));
    assert!(matches!(
        orm.bulk_update::<User>(&[]).err().unwrap(),
        OrmError::NoPendingRecords
    ));
}

#[test]
fn upsert_is_unimplemented() {
    let mut orm = orm();
    assert!(matches!(
        orm.upsert(&user(1, "Naruto")),
        Err(OrmError::Unimplemented("upsert"))
    ));
    assert!(matches!(
        orm.bulk_upsert(&[user(1, "Naruto")]),
        Err(OrmError::Unimplemented("bulk_upsert"))
    ));
    assert!(orm.store().calls.is_empty());
}

#[test]
fn parse_error_names_field() {
    let mut orm = orm();
    let mut row = raw_row(1, "Naruto");
    row[2] = Value::from("thirteen");
    orm.store_mut().queue_rows(vec![row]);

    let err = orm.select::<User>().unwrap().first().unwrap_err();
    match err {
        OrmError::Parse { field, ty } => {
            assert_eq!(field, "age");
            assert_eq!(ty, "integer");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn verbs_reset_state() {
    let mut orm = orm();
    let _ = orm
        .select::<User>()
        .unwrap()
        .where_(field("id").eq(1))
        .unwrap();
    assert!(!orm.current_where().is_empty());

    let _ = orm.select::<User>().unwrap();
    assert_eq!(orm.current_sql(), SELECT_USER);
    assert!(orm.current_where().is_empty());
    assert!(orm.current_params().is_empty());
    assert_eq!(orm.phase(), Phase::Building);
}

#[test]
fn unknown_field_in_where_fails_before_store() {
    let mut orm = orm();
    let err = orm
        .select::<User>()
        .unwrap()
        .where_(field("uid").eq(1))
        .err()
        .unwrap();
    assert!(matches!(err, OrmError::UnknownField { .. }));
    assert!(orm.store().calls.is_empty());
}

#[test]
fn query_field_handles() {
    let mut orm = orm();
    let query = orm.select::<User>().unwrap();
    assert_eq!(query.field("age").unwrap().name(), "age");
    assert!(query.field("nope").is_err());
    let names: Vec<_> = query.fields().iter().map(|f| f.name().to_string()).collect();
    assert_eq!(names, ["id", "name", "age", "birth", "percentage"]);
}

#[test]
fn delete_with_empty_where_is_rejected_before_store() {
    let mut orm = orm();
    let err = orm
        .delete::<User>()
        .unwrap()
        .where_(Expression::new())
        .err()
        .unwrap();
    assert!(matches!(err, OrmError::EmptyWhere("delete", _)));
    assert!(orm.store().calls.is_empty());
    assert_eq!(orm.phase(), Phase::Building);
}

#[test]
fn update_with_empty_where_is_rejected_before_store() {
    let mut orm = orm();
    let err = orm
        .update::<User>()
        .unwrap()
        .set(field("name").eq("z"))
        .unwrap()
        .where_(Expression::new())
        .err()
        .unwrap();
    assert!(matches!(err, OrmError::EmptyWhere("update", _)));
    assert!(orm.store().calls.is_empty());
}

#[test]
fn select_with_empty_where_matches_everything() {
    let mut orm = orm();
    orm.select::<User>()
        .unwrap()
        .where_(Expression::new())
        .unwrap()
        .all()
        .unwrap();
    assert_eq!(orm.current_sql(), SELECT_USER);
}

#[test]
fn using_without_keys_is_rejected_before_store() {
    let mut orm = orm();
    let err = orm
        .update_record(&user(99, "x"))
        .unwrap()
        .using(Vec::<Field>::new())
        .unwrap_err();
    assert!(matches!(err, OrmError::NoKeys(_)));
    assert!(orm.store().calls.is_empty());

    let err = orm
        .bulk_update(&[user(1, "a"), user(2, "b")])
        .unwrap()
        .using(Vec::<&str>::new())
        .unwrap_err();
    assert!(matches!(err, OrmError::NoKeys(_)));
    assert!(orm.store().calls.is_empty());
}
