//! Rendering tests for the statement builder.

use super::*;
use crate::clause::BoolOp;
use crate::error::SqlError;
use crate::params;

fn mysql() -> Statement {
    Statement::new(Dialect::mysql())
}

fn pg() -> Statement {
    Statement::new(Dialect::postgres())
}

// ==================== SELECT ====================

#[test]
fn test_select_where_limit_mysql() {
    let sql = mysql()
        .table("users")
        .select("*")
        .where_("?? > ?", params!["old", 50])
        .limit(0, 10)
        .to_sql(false)
        .unwrap();
    assert_eq!(sql, "SELECT * FROM `users` WHERE (`old` > 50) LIMIT 0, 10");
}

#[test]
fn test_select_where_limit_postgres() {
    let sql = pg()
        .table("users")
        .select("*")
        .where_("?? > ?", params!["old", 50])
        .limit(0, 10)
        .to_sql(false)
        .unwrap();
    assert_eq!(sql, r#"SELECT * FROM "users" WHERE ("old" > 50) LIMIT 10 OFFSET 0"#);
}

#[test]
fn test_select_defaults_to_star() {
    assert_eq!(mysql().table("users").to_sql(false).unwrap(), "SELECT * FROM `users`");
}

#[test]
fn test_select_accumulates_fields() {
    let sql = mysql()
        .table("users AS u")
        .select("u.id")
        .select(vec!["u.name", "u.email AS mail"])
        .to_sql(false)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT `u`.`id`, `u`.`name`, `u`.`email` AS `mail` FROM `users` AS `u`"
    );
}

#[test]
fn test_missing_table() {
    let err = mysql().select("*").to_sql(false).unwrap_err();
    assert!(matches!(err, SqlError::MissingTable("table()")));

    let err = pg().delete().to_sql(false).unwrap_err();
    assert!(err.is_missing_table());
}

#[test]
fn test_join_with_template() {
    let sql = mysql()
        .table("users AS u")
        .select("u.name, r.title")
        .left_join("roles AS r", "?? = ??", params!["u.role_id", "r.id"])
        .to_sql(false)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT `u`.`name`, `r`.`title` FROM `users` AS `u` LEFT JOIN `roles` AS `r` ON `u`.`role_id` = `r`.`id`"
    );
}

#[test]
fn test_join_kinds_keep_order() {
    let sql = pg()
        .table("a")
        .inner_join("b", "?? = ??", params!["a.id", "b.a_id"])
        .right_join("c", "", params![])
        .to_sql(false)
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT * FROM "a" INNER JOIN "b" ON "a"."id" = "b"."a_id" RIGHT JOIN "c""#
    );
}

#[test]
fn test_aggregate_takes_one_field() {
    let err = mysql()
        .table("t")
        .aggregate("count", "a, b", None)
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgumentShape(_)));

    let err = mysql()
        .table("t")
        .aggregate("sum", vec!["a", "b"], None)
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgumentShape(_)));
}

#[test]
fn test_group_by_having_aggregate() {
    let sql = mysql()
        .table("orders")
        .select("user_id")
        .aggregate("sum", "total", Some("spent"))
        .group_by("user_id")
        .having("SUM(??) > ?", params!["total", 100])
        .order_by("spent", "desc")
        .to_sql(false)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT `user_id`, SUM(`total`) AS `spent` FROM `orders` GROUP BY `user_id` HAVING (SUM(`total`) > 100) ORDER BY `spent` DESC"
    );
}

#[test]
fn test_aggregate_only_select_list() {
    let sql = pg()
        .table("users")
        .aggregate("COUNT", "*", None)
        .to_sql(false)
        .unwrap();
    assert_eq!(sql, r#"SELECT COUNT(*) FROM "users""#);
}

#[test]
fn test_unsupported_aggregate_produces_no_text() {
    let stmt = mysql()
        .table("users")
        .aggregate("group_concat", "name", None)
        .select("id");
    assert!(matches!(stmt.error(), Some(SqlError::UnsupportedAggregate(_))));
    assert!(matches!(
        stmt.to_sql(false),
        Err(SqlError::UnsupportedAggregate(_))
    ));
    assert!(stmt.to_structured().is_err());
}

#[test]
fn test_order_by_multiple_fields() {
    let sql = mysql()
        .table("users")
        .order_by("name, id", "DESC")
        .order_by("created_at", "asc")
        .to_sql(false)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `users` ORDER BY `name` DESC, `id` DESC, `created_at` ASC"
    );
}

#[test]
fn test_order_by_invalid_direction() {
    let err = mysql()
        .table("users")
        .order_by("name", "sideways")
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidOperator(_)));
}

#[test]
fn test_limit_replaces_previous() {
    let sql = mysql().table("t").limit(0, 10).limit(5, 5).to_sql(false).unwrap();
    assert_eq!(sql, "SELECT * FROM `t` LIMIT 5, 5");
}

// ==================== WHERE ====================

#[test]
fn test_or_where_groups_following_entries() {
    let sql = mysql()
        .table("t")
        .where_("?? = ?", params!["a", 1])
        .or_where("?? = ?", params!["b", 2])
        .where_("?? = ?", params!["c", 3])
        .to_sql(false)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `t` WHERE (`a` = 1 OR (`b` = 2 AND `c` = 3))"
    );
}

#[test]
fn test_where_with_explicit_operator() {
    let sql = pg()
        .table("t")
        .where_with("a = ?", params![1], "and")
        .where_with("b = ?", params![2], "OR")
        .where_("c = ?", params![3])
        .to_sql(false)
        .unwrap();
    assert_eq!(sql, r#"SELECT * FROM "t" WHERE (a = 1 AND (b = 2 OR c = 3))"#);
}

#[test]
fn test_or_affordance_flips_previous_entry() {
    let stmt = mysql()
        .table("t")
        .where_("a", params![])
        .or()
        .where_("b", params![])
        .and()
        .where_("c", params![]);
    let snapshot = stmt.to_structured().unwrap();
    let ops: Vec<_> = snapshot
        .clause(ClauseKind::Where)
        .iter()
        .map(|f| f.op.unwrap_or_default())
        .collect();
    assert_eq!(ops, vec![BoolOp::Or, BoolOp::And, BoolOp::And]);
    assert_eq!(stmt.to_sql(false).unwrap(), "SELECT * FROM `t` WHERE (a OR (b AND c))");
}

#[test]
fn test_or_applies_to_latest_predicate_clause() {
    let sql = mysql()
        .table("t")
        .where_("a", params![])
        .group_by("g")
        .having("x", params![])
        .or()
        .having("y", params![])
        .to_sql(false)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `t` WHERE (a) GROUP BY `g` HAVING (x OR y)"
    );
}

#[test]
fn test_invalid_boolean_operator() {
    let err = mysql()
        .table("t")
        .where_with("a = 1", params![], "XOR")
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidOperator(_)));
}

#[test]
fn test_where_in_list() {
    let sql = mysql()
        .table("users")
        .where_in("id", vec![1, 2, 3])
        .to_sql(false)
        .unwrap();
    assert_eq!(sql, "SELECT * FROM `users` WHERE (`id` IN (1, 2, 3))");
}

#[test]
fn test_unresolved_placeholder() {
    let err = mysql()
        .table("t")
        .where_("?? = ?", params!["a"])
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::PlaceholderMismatch(_)));
}

#[test]
fn test_search_mysql_and_postgres() {
    let sql = mysql()
        .table("posts")
        .search("title, body", "rust")
        .to_sql(false)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `posts` WHERE (MATCH (`title`, `body`) AGAINST ('rust'))"
    );

    let sql = pg().table("posts").search("title", "rust").to_sql(false).unwrap();
    assert_eq!(
        sql,
        r#"SELECT * FROM "posts" WHERE (to_tsvector("title") @@ to_tsquery('rust'))"#
    );
}

#[test]
fn test_search_requires_fields_and_term() {
    let err = mysql().table("posts").search("title", "  ").to_sql(false).unwrap_err();
    assert!(matches!(err, SqlError::EmptySearchArgument));

    let err = mysql()
        .table("posts")
        .search(Vec::<String>::new(), "rust")
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::EmptySearchArgument));
}

// ==================== INSERT / UPDATE / DELETE ====================

#[test]
fn test_insert_two_rows() {
    let sql = mysql()
        .table("t")
        .insert(vec![
            row([("name", Value::from("ann")), ("old", Value::from(30))]),
            row([("old", Value::from(41)), ("name", Value::from("bob"))]),
        ])
        .to_sql(false)
        .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO `t` (`name`, `old`) VALUES ('ann', 30), ('bob', 41)"
    );
}

#[test]
fn test_insert_appends_rows_across_calls() {
    let sql = pg()
        .table("t")
        .insert(vec![row([("name", "ann")])])
        .insert(vec![row([("name", "o'neil")])])
        .to_sql(false)
        .unwrap();
    assert_eq!(sql, r#"INSERT INTO "t" ("name") VALUES ('ann'), ('o''neil')"#);
}

#[test]
fn test_insert_rejects_mismatched_rows() {
    let err = mysql()
        .table("t")
        .insert(vec![row([("a", 1)]), row([("b", 2)])])
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgumentShape(_)));

    let err = mysql()
        .table("t")
        .insert(vec![row([("a", 1)]), row([("a", 2), ("b", 3)])])
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgumentShape(_)));

    let err = mysql().table("t").insert(Vec::<Row>::new()).to_sql(false).unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgumentShape(_)));
}

#[test]
fn test_insert_rejects_duplicate_and_unknown_columns() {
    let err = mysql()
        .table("t")
        .insert(vec![row([("a", 1), ("a", 2)])])
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgumentShape(_)));

    let err = mysql()
        .table("t")
        .insert(vec![row([("a", 1), ("b", 2)]), row([("a", 3), ("c", 4)])])
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgumentShape(_)));

    let err = pg()
        .table("t")
        .insert(vec![row([("a", 1)])])
        .insert(vec![row([("a", 3), ("a", 4)])])
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgumentShape(_)));
}

#[test]
fn test_insert_rejects_clauses_it_cannot_render() {
    let err = mysql()
        .table("t")
        .where_("?? = ?", params!["id", 1])
        .insert(vec![row([("a", 1)])])
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgumentShape(_)));

    let err = mysql()
        .table("t")
        .order_by("a", "asc")
        .insert(vec![row([("a", 1)])])
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgumentShape(_)));
}

#[test]
fn test_update_rejects_duplicate_columns() {
    let err = pg()
        .table("t")
        .update(row([("a", 1), ("a", 2)]))
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgumentShape(_)));
}

#[test]
fn test_postgres_rejects_limit_on_update_and_delete() {
    let err = pg()
        .table("t")
        .update(row([("a", 1)]))
        .limit(0, 1)
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgumentShape(_)));

    let err = pg().table("t").limit(0, 1).delete().to_sql(false).unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgumentShape(_)));

    let sql = mysql().table("t").delete().limit(0, 1).to_sql(false).unwrap();
    assert_eq!(sql, "DELETE FROM `t` LIMIT 0, 1");
}

#[test]
fn test_update_with_where_order_limit() {
    let sql = mysql()
        .table("users")
        .update(row([("name", Value::from("x")), ("active", Value::from(false))]))
        .where_("?? = ?", params!["id", 1])
        .order_by("id", "asc")
        .limit(0, 1)
        .to_sql(false)
        .unwrap();
    assert_eq!(
        sql,
        "UPDATE `users` SET `name` = 'x', `active` = false WHERE (`id` = 1) ORDER BY `id` ASC LIMIT 0, 1"
    );
}

#[test]
fn test_update_rejects_list_values() {
    let err = pg()
        .table("users")
        .update(row([("tags", vec!["a", "b"])]))
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidArgumentShape(_)));
}

#[test]
fn test_delete() {
    let sql = pg()
        .table("sessions")
        .delete()
        .where_("?? < ?", params!["expires_at", Value::raw("NOW()")])
        .to_sql(false)
        .unwrap();
    assert_eq!(sql, r#"DELETE FROM "sessions" WHERE ("expires_at" < NOW())"#);
}

#[test]
fn test_switching_kind_starts_a_new_session() {
    let sql = mysql()
        .table("users")
        .select("id")
        .where_("?? = ?", params!["id", 1])
        .update(row([("name", "x")]))
        .to_sql(false)
        .unwrap();
    assert_eq!(sql, "UPDATE `users` SET `name` = 'x'");
}

#[test]
fn test_predicates_before_kind_are_kept() {
    let sql = mysql()
        .table("users")
        .where_("?? = ?", params!["id", 1])
        .delete()
        .to_sql(false)
        .unwrap();
    assert_eq!(sql, "DELETE FROM `users` WHERE (`id` = 1)");
}

// ==================== JSON ====================

#[test]
fn test_select_json_object() {
    let sql = mysql()
        .table("users AS u")
        .select_json("id:u.id, name:u.name", JsonKind::Object, "profile")
        .to_sql(false)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT json_object('id', `u`.`id`, 'name', `u`.`name`) AS `profile` FROM `users` AS `u`"
    );
}

#[test]
fn test_select_json_unsupported_server() {
    use crate::dialect::ServerVersion;

    let dialect = Dialect::mysql().with_server_version(ServerVersion::new(5, 6, 40));
    let err = Statement::new(dialect)
        .table("users")
        .select_json("a, b", JsonKind::Array, "")
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::JsonUnsupported { .. }));
}

// ==================== Sub-statements ====================

fn admin_roles() -> Statement {
    mysql()
        .table("roles")
        .select("id")
        .where_("?? = ?", params!["admin", true])
}

#[test]
fn test_where_in_sub_compact() {
    let sql = mysql()
        .table("users")
        .where_in_sub("role_id", admin_roles())
        .to_sql(false)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `users` WHERE (`role_id` IN (SELECT `id` FROM `roles` WHERE (`admin` = true)))"
    );
}

#[test]
fn test_sub_statement_dialect_must_match_parent() {
    let roles = pg().table("roles").select("id").where_("?? = ?", params!["name", "o'neil"]);
    let err = mysql()
        .table("users")
        .where_in_sub("role_id", roles)
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::Config(_)));

    let inner = pg().table("users").select("id").alias("t");
    let err = mysql().from(inner).to_sql(false).unwrap_err();
    assert!(matches!(err, SqlError::Config(_)));
}

#[test]
fn test_where_in_sub_pretty() {
    let sql = mysql()
        .table("users")
        .where_in_sub("role_id", admin_roles())
        .to_sql(true)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT *\nFROM `users`\nWHERE (`role_id` IN (\n\tSELECT `id`\n\tFROM `roles`\n\tWHERE (`admin` = true)\n))"
    );
}

#[test]
fn test_pretty_top_level() {
    let sql = pg()
        .table("users")
        .select("id")
        .where_("?? = ?", params!["id", 1])
        .order_by("id", "ASC")
        .to_sql(true)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT \"id\"\nFROM \"users\"\nWHERE (\"id\" = 1)\nORDER BY \"id\" ASC"
    );
}

#[test]
fn test_aliased_sub_statement_in_select() {
    let count = mysql()
        .table("orders")
        .aggregate("count", "*", None)
        .where_("?? = ??", params!["orders.user_id", "users.id"])
        .alias("order_count");
    let sql = mysql()
        .table("users")
        .select("id")
        .select(count)
        .to_sql(false)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT `id`, (SELECT COUNT(*) FROM `orders` WHERE (`orders`.`user_id` = `users`.`id`)) AS `order_count` FROM `users`"
    );
}

#[test]
fn test_nested_sub_statements_indent_per_level() {
    let inner = mysql().table("c").select("id");
    let middle = mysql().table("b").select("id").where_in_sub("c_id", inner);
    let sql = mysql()
        .table("a")
        .where_in_sub("b_id", middle)
        .to_sql(true)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT *\nFROM `a`\nWHERE (`b_id` IN (\n\tSELECT `id`\n\tFROM `b`\n\tWHERE (`c_id` IN (\n\t\tSELECT `id`\n\t\tFROM `c`\n\t))\n))"
    );
}

#[test]
fn test_sub_statement_as_from_source() {
    let inner = pg().table("users").select("id").alias("t");
    let sql = pg().from(inner).select("t.id").to_sql(false).unwrap();
    assert_eq!(
        sql,
        r#"SELECT "t"."id" FROM (SELECT "id" FROM "users") AS "t""#
    );
}

#[test]
fn test_sub_statement_requires_alias() {
    let err = mysql()
        .table("users")
        .select(admin_roles())
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::MissingAlias(_)));

    let err = mysql().from(admin_roles()).to_sql(false).unwrap_err();
    assert!(matches!(err, SqlError::MissingAlias(_)));

    let err = mysql()
        .table("users")
        .left_join(admin_roles(), "", params![])
        .to_sql(false)
        .unwrap_err();
    assert!(matches!(err, SqlError::MissingAlias(_)));
}

#[test]
fn test_sub_statement_errors_propagate() {
    let broken = mysql().table("roles").order_by("id", "up").alias("r");
    let err = mysql().table("users").select(broken).to_sql(false).unwrap_err();
    assert!(matches!(err, SqlError::InvalidOperator(_)));
}

// ==================== Lifecycle ====================

#[test]
fn test_rendering_is_idempotent() {
    let stmt = mysql()
        .table("users")
        .where_in_sub("role_id", admin_roles())
        .limit(0, 5);
    assert_eq!(stmt.to_sql(false).unwrap(), stmt.to_sql(false).unwrap());
    assert_eq!(stmt.to_sql(true).unwrap(), stmt.to_sql(true).unwrap());
}

#[test]
fn test_structured_round_trip() {
    let stmt = mysql()
        .table("users AS u")
        .select("u.id")
        .left_join("roles AS r", "?? = ??", params!["u.role_id", "r.id"])
        .where_in_sub("u.role_id", admin_roles())
        .or_where("?? LIKE ?", params!["u.name", "a%"])
        .order_by("u.id", "desc")
        .limit(10, 10);

    let snapshot = stmt.to_structured().unwrap();
    let json = serde_json::to_string(&snapshot).unwrap();
    let restored: StatementSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, snapshot);

    let rebuilt = Statement::from_structured(Dialect::mysql(), restored);
    assert_eq!(rebuilt.to_sql(false).unwrap(), stmt.to_sql(false).unwrap());
    assert_eq!(rebuilt.to_sql(true).unwrap(), stmt.to_sql(true).unwrap());
}

#[test]
fn test_restored_insert_accepts_more_rows() {
    let stmt = mysql().table("t").insert(vec![row([("a", 1), ("b", 2)])]);
    let rebuilt = Statement::from_structured(Dialect::mysql(), stmt.to_structured().unwrap())
        .insert(vec![row([("b", 4), ("a", 3)])]);
    assert_eq!(
        rebuilt.to_sql(false).unwrap(),
        "INSERT INTO `t` (`a`, `b`) VALUES (1, 2), (3, 4)"
    );
}

#[test]
fn test_reset_keeps_table_and_clears_errors() {
    let stmt = mysql()
        .table("users")
        .aggregate("median", "age", None)
        .reset()
        .select("id");
    assert_eq!(stmt.kind(), Some(StatementKind::Select));
    assert_eq!(stmt.to_sql(false).unwrap(), "SELECT `id` FROM `users`");
}

#[test]
fn test_first_error_wins() {
    let stmt = mysql()
        .table("users")
        .order_by("id", "up")
        .aggregate("median", "age", None);
    assert!(matches!(stmt.error(), Some(SqlError::InvalidOperator(_))));
}

#[test]
fn test_configured_pretty_flag() {
    let stmt = mysql()
        .with_config(StatementConfig::new().pretty(true))
        .table("users");
    assert_eq!(stmt.sql().unwrap(), "SELECT *\nFROM `users`");
}

#[test]
fn test_push_clause_appends_in_order() {
    let sql = pg()
        .table("events")
        .push_clause(ClauseKind::Where, Fragment::sql("ts > now() - interval '1 day'"))
        .or()
        .push_clause(ClauseKind::Where, Fragment::sql("pinned"))
        .push_clause(ClauseKind::OrderBy, Fragment::sql("ts DESC"))
        .to_sql(false)
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT * FROM "events" WHERE (ts > now() - interval '1 day' OR pinned) ORDER BY ts DESC"#
    );
}
