use sqlscope::{
    Dialect, Filter, ListQueryRequest, PlaceholderStyle, Value, build_audit_entries_query,
    build_list_query, count_placeholders, filtered_count_subquery, total_count_subquery,
};

fn tenant_request(filter: Filter) -> ListQueryRequest {
    ListQueryRequest::builder("items")
        .ownership_column("belongs_to_account")
        .columns(["items.id", "items.name"])
        .requester_id(42)
        .filter(Some(filter))
        .build()
        .unwrap()
}

fn admin_request(filter: Filter) -> ListQueryRequest {
    ListQueryRequest::builder("items")
        .ownership_column("belongs_to_account")
        .columns(["items.id", "items.name"])
        .requester_id(42)
        .for_admin(true)
        .filter(Some(filter))
        .build()
        .unwrap()
}

fn filters() -> Vec<Filter> {
    vec![
        Filter::default(),
        Filter::builder().page(3).limit(7).build().unwrap(),
        Filter::builder().created_after(1u64).build().unwrap(),
        Filter::builder()
            .created_after(1u64)
            .created_before(2u64)
            .updated_after(3u64)
            .updated_before(4u64)
            .build()
            .unwrap(),
        Filter::builder().updated_before(9u64).include_archived(true).build().unwrap(),
    ]
}

#[test]
fn placeholder_count_matches_args() {
    for dialect in Dialect::ALL {
        for filter in filters() {
            for req in [tenant_request(filter.clone()), admin_request(filter)] {
                let q = build_list_query(dialect, &req).unwrap();
                assert_eq!(
                    count_placeholders(&q.sql, dialect.placeholder_style()),
                    q.args.len(),
                    "{dialect}: {}",
                    q.sql
                );
            }
        }
    }
}

#[test]
fn postgres_placeholders_are_sequential() {
    let filter = filters().pop().unwrap();
    let q = build_list_query(Dialect::Postgres, &tenant_request(filter)).unwrap();
    for i in 1..=q.args.len() {
        assert!(q.sql.contains(&format!("${i}")), "missing ${i} in {}", q.sql);
    }
    assert!(!q.sql.contains(&format!("${}", q.args.len() + 1)));
}

#[test]
fn tenant_ownership_appears_once_per_where_clause() {
    for dialect in Dialect::ALL {
        for filter in filters() {
            let q = build_list_query(dialect, &tenant_request(filter)).unwrap();
            // two count subqueries and the outer WHERE
            assert_eq!(q.sql.matches("items.belongs_to_account = ").count(), 3);
            assert_eq!(
                q.args.iter().filter(|v| **v == Value::Integer(42)).count(),
                3
            );
        }
    }
}

#[test]
fn archived_rows_excluded_by_default() {
    for dialect in Dialect::ALL {
        let filter = Filter::builder().include_archived(false).build().unwrap();
        for req in [tenant_request(filter.clone()), admin_request(filter)] {
            let q = build_list_query(dialect, &req).unwrap();
            assert_eq!(q.sql.matches("items.archived_on IS NULL").count(), 3);
        }
    }
}

#[test]
fn include_archived_only_honored_for_admins() {
    let filter = Filter::builder().include_archived(true).build().unwrap();

    let tenant = build_list_query(Dialect::Sqlite, &tenant_request(filter.clone())).unwrap();
    assert_eq!(tenant.sql.matches("archived_on IS NULL").count(), 3);

    let admin = build_list_query(Dialect::Sqlite, &admin_request(filter)).unwrap();
    assert!(!admin.sql.contains("archived_on"));
    assert!(!admin.sql.contains("belongs_to_account"));
    assert!(!admin.sql.contains("WHERE"));
    assert!(admin.args.is_empty());
}

#[test]
fn admin_without_include_archived_keeps_archival_only() {
    let q = build_list_query(Dialect::MariaDb, &admin_request(Filter::default())).unwrap();
    assert_eq!(q.sql.matches("items.archived_on IS NULL").count(), 3);
    assert!(!q.sql.contains("belongs_to_account"));
    assert!(q.args.is_empty());
}

#[test]
fn total_count_ignores_time_bounds() {
    let plain = tenant_request(Filter::default());
    let bounded = tenant_request(
        Filter::builder()
            .created_after(100u64)
            .updated_before(200u64)
            .build()
            .unwrap(),
    );

    for dialect in Dialect::ALL {
        let (a, b) = (
            total_count_subquery(dialect, &plain),
            total_count_subquery(dialect, &bounded),
        );
        assert_eq!(a.render(dialect), b.render(dialect));
        assert_eq!(a.params(), b.params());

        let (a, b) = (
            filtered_count_subquery(dialect, &plain),
            filtered_count_subquery(dialect, &bounded),
        );
        assert_ne!(a.render(dialect), b.render(dialect));
        assert_ne!(a.params(), b.params());
    }
}

#[test]
fn pagination_arithmetic() {
    for page in [1u64, 2, 10, 1_000] {
        for limit in [1u32, 20, 250] {
            let filter = Filter::builder().page(page).limit(limit).build().unwrap();
            let expected = (page - 1) * u64::from(limit);
            assert_eq!(filter.offset(), expected);

            let q = build_list_query(Dialect::Sqlite, &tenant_request(filter)).unwrap();
            assert!(
                q.sql.ends_with(&format!(" LIMIT {limit} OFFSET {expected}")),
                "{}",
                q.sql
            );
        }
    }
}

#[test]
fn identical_requests_build_identical_queries() {
    for dialect in Dialect::ALL {
        for filter in filters() {
            let a = build_list_query(dialect, &tenant_request(filter.clone())).unwrap();
            let b = build_list_query(dialect, &tenant_request(filter)).unwrap();
            assert_eq!(a, b);
        }
    }
}

#[test]
fn page_ten_of_items() {
    let filter = Filter::builder().page(10).limit(20).build().unwrap();
    let q = build_list_query(Dialect::MariaDb, &tenant_request(filter)).unwrap();

    assert!(q.sql.ends_with("GROUP BY items.id LIMIT 20 OFFSET 180"));
    assert_eq!(q.args, vec![Value::Integer(42); 3]);
    assert_eq!(count_placeholders(&q.sql, PlaceholderStyle::Question), 3);
}

#[test]
fn audit_value_is_only_bound() {
    for dialect in Dialect::ALL {
        let q = build_audit_entries_query(dialect, 777u64, &["item_id"]).unwrap();
        assert_eq!(q.args, vec![Value::Integer(777)]);
        assert!(!q.sql.contains("777"));
        assert_eq!(count_placeholders(&q.sql, dialect.placeholder_style()), 1);
    }
}

#[test]
fn generated_query_serializes_args() {
    let q = build_list_query(Dialect::Sqlite, &tenant_request(Filter::default())).unwrap();
    let json = serde_json::to_value(&q).unwrap();
    assert_eq!(json["args"][0]["type"], "integer");
    assert_eq!(json["args"][0]["value"], 42);
}
