use bson::{Bson, Document, doc};
use proptest::prelude::*;
use rowbridge::MemoryStore;
use rowbridge::query::{self, FindOptions, Order, SortSpec, find_fallback, parse_filter};

const TABLE: &str = "rows";

// Plain model of a cell, used by the reference evaluator below.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Missing,
    Null,
    Int(i32),
    Str(String),
}

impl Cell {
    fn is_null(&self) -> bool {
        matches!(self, Self::Missing | Self::Null)
    }

    fn to_bson(&self) -> Option<Bson> {
        match self {
            Self::Missing => None,
            Self::Null => Some(Bson::Null),
            Self::Int(i) => Some(Bson::Int32(*i)),
            Self::Str(s) => Some(Bson::String(s.clone())),
        }
    }
}

#[derive(Debug, Clone)]
struct Row {
    id: i32,
    a: Cell,
    s: Cell,
    k: i32,
}

impl Row {
    fn cell(&self, field: &str) -> &Cell {
        if field == "a" { &self.a } else { &self.s }
    }

    fn to_doc(&self) -> Document {
        let mut d = doc! { "id": self.id, "k": self.k };
        if let Some(v) = self.a.to_bson() {
            d.insert("a", v);
        }
        if let Some(v) = self.s.to_bson() {
            d.insert("s", v);
        }
        d
    }
}

#[derive(Debug, Clone)]
enum Pred {
    Eq(&'static str, Cell),
    In(&'static str, Vec<Cell>),
    Ne(&'static str, Cell),
    Exists(&'static str, bool),
    Regex(String, &'static str),
    Or(Vec<(&'static str, Cell)>),
}

impl Pred {
    fn key(&self) -> &'static str {
        match self {
            Self::Eq(f, _) | Self::In(f, _) | Self::Ne(f, _) | Self::Exists(f, _) => f,
            Self::Regex(..) => "s",
            Self::Or(_) => "$or",
        }
    }

    fn value(&self) -> Bson {
        let val = |c: &Cell| c.to_bson().unwrap_or(Bson::Null);
        match self {
            Self::Eq(_, c) => val(c),
            Self::In(_, cs) => Bson::Array(cs.iter().map(val).collect()),
            Self::Ne(_, c) => Bson::Document(doc! { "$ne": val(c) }),
            Self::Exists(_, b) => Bson::Document(doc! { "$exists": *b }),
            Self::Regex(p, opts) => Bson::Document(doc! { "$regex": p.clone(), "$options": *opts }),
            Self::Or(branches) => Bson::Array(
                branches.iter().map(|(f, c)| Bson::Document(doc! { *f: val(c) })).collect(),
            ),
        }
    }

    fn holds(&self, row: &Row) -> bool {
        match self {
            Self::Eq(f, target) => {
                let cell = row.cell(f);
                if target.is_null() { cell.is_null() } else { cell == target }
            }
            Self::In(f, set) => {
                let cell = row.cell(f);
                !cell.is_null() && set.contains(cell)
            }
            Self::Ne(f, target) => {
                let cell = row.cell(f);
                !cell.is_null() && (target.is_null() || cell != target)
            }
            Self::Exists(f, present) => row.cell(f).is_null() != *present,
            Self::Regex(p, opts) => match &row.s {
                Cell::Str(s) if opts.is_empty() || opts.contains('i') => {
                    s.to_lowercase().contains(&p.to_lowercase())
                }
                Cell::Str(s) => s.contains(p.as_str()),
                _ => false,
            },
            Self::Or(branches) => branches.iter().any(|(f, target)| {
                let cell = row.cell(f);
                let blank = |c: &Cell| c.is_null() || *c == Cell::Str(String::new());
                if blank(target) { blank(cell) } else { cell == target }
            }),
        }
    }
}

fn a_cell() -> impl Strategy<Value = Cell> {
    prop_oneof![Just(Cell::Missing), Just(Cell::Null), (0..3i32).prop_map(Cell::Int)]
}

fn s_cell() -> impl Strategy<Value = Cell> {
    prop_oneof![
        Just(Cell::Missing),
        Just(Cell::Null),
        prop::sample::select(vec!["", "x", "Xy", "yx", "zz"]).prop_map(|s| Cell::Str(s.to_string())),
    ]
}

fn target(field: &'static str) -> BoxedStrategy<Cell> {
    let s = if field == "a" { a_cell().boxed() } else { s_cell().boxed() };
    s.prop_map(|c| if c == Cell::Missing { Cell::Null } else { c }).boxed()
}

fn rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec((a_cell(), s_cell(), 0..3i32), 0..12).prop_map(|cells| {
        cells
            .into_iter()
            .enumerate()
            .map(|(i, (a, s, k))| Row { id: i32::try_from(i).unwrap(), a, s, k })
            .collect()
    })
}

fn field_pred(field: &'static str) -> BoxedStrategy<Pred> {
    prop_oneof![
        target(field).prop_map(move |c| Pred::Eq(field, c)),
        prop::collection::vec(target(field).prop_filter("non-null", |c| !c.is_null()), 1..3)
            .prop_map(move |cs| Pred::In(field, cs)),
        target(field).prop_map(move |c| Pred::Ne(field, c)),
        any::<bool>().prop_map(move |b| Pred::Exists(field, b)),
    ]
    .boxed()
}

fn s_pred() -> BoxedStrategy<Pred> {
    prop_oneof![
        field_pred("s"),
        (prop::sample::select(vec!["x", "X", "y", "Y"]), prop::sample::select(vec!["", "i", "s"]))
            .prop_map(|(p, o)| Pred::Regex(p.to_string(), o)),
    ]
    .boxed()
}

fn or_pred() -> impl Strategy<Value = Pred> {
    prop::collection::vec(
        prop_oneof![target("a").prop_map(|c| ("a", c)), target("s").prop_map(|c| ("s", c))],
        1..4,
    )
    .prop_map(Pred::Or)
}

/// At most one predicate per key, so the filter document holds each of them.
fn preds() -> impl Strategy<Value = Vec<Pred>> {
    (
        prop::option::of(field_pred("a")),
        prop::option::of(s_pred()),
        prop::option::of(or_pred()),
    )
        .prop_map(|(a, s, o)| [a, s, o].into_iter().flatten().collect())
}

fn options() -> impl Strategy<Value = FindOptions> {
    (prop::option::of(any::<bool>()), prop::option::of(0..6usize)).prop_map(|(dir, limit)| FindOptions {
        sort: dir.map(|desc| vec![if desc { SortSpec::desc("k") } else { SortSpec::asc("k") }]),
        limit,
    })
}

fn filter_doc(preds: &[Pred]) -> Document {
    let mut d = Document::new();
    for p in preds {
        d.insert(p.key(), p.value());
    }
    d
}

fn reference(rows: &[Row], preds: &[Pred], opts: &FindOptions) -> Vec<i32> {
    let mut hits: Vec<&Row> = rows.iter().filter(|r| preds.iter().all(|p| p.holds(r))).collect();
    if let Some(sort) = &opts.sort {
        hits.sort_by(|x, y| match sort[0].order {
            Order::Asc => x.k.cmp(&y.k),
            Order::Desc => y.k.cmp(&x.k),
        });
    }
    let mut ids: Vec<i32> = hits.into_iter().map(|r| r.id).collect();
    if let Some(n) = opts.limit.filter(|n| *n > 0) {
        ids.truncate(n);
    }
    ids
}

fn store(rows: &[Row]) -> MemoryStore {
    let store = MemoryStore::new();
    store.create_table(TABLE);
    store.insert_many(TABLE, rows.iter().map(Row::to_doc));
    store
}

fn ids(docs: &[Document]) -> Vec<i32> {
    docs.iter().map(|d| d.get_i32("id").unwrap()).collect()
}

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 128,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_find_matches_brute_force(rows in rows(), preds in preds(), opts in options()) {
        let store = store(&rows);
        let filter = parse_filter(&filter_doc(&preds)).unwrap();
        let expected = reference(&rows, &preds, &opts);
        let got = block_on(query::find(&store, TABLE, &filter, &opts)).unwrap();
        prop_assert_eq!(ids(&got), expected.clone());
        let fallback = block_on(find_fallback(&store, TABLE, &filter, &opts)).unwrap();
        prop_assert_eq!(ids(&fallback), expected);
    }

    #[test]
    fn prop_key_order_does_not_matter(rows in rows(), preds in preds(), opts in options()) {
        let store = store(&rows);
        let forward = parse_filter(&filter_doc(&preds)).unwrap();
        let mut reversed_preds = preds.clone();
        reversed_preds.reverse();
        let reversed = parse_filter(&filter_doc(&reversed_preds)).unwrap();
        let a = block_on(query::find(&store, TABLE, &forward, &opts)).unwrap();
        let b = block_on(query::find(&store, TABLE, &reversed, &opts)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_blank_or_targets_are_interchangeable(rows in rows(), field in prop::sample::select(vec!["a", "s"])) {
        let store = store(&rows);
        let opts = FindOptions::default();
        let mut results = Vec::new();
        for target in [Bson::Null, Bson::String(String::new())] {
            let f = parse_filter(&doc! { "$or": [ { field: target } ] }).unwrap();
            results.push(ids(&block_on(query::find(&store, TABLE, &f, &opts)).unwrap()));
        }
        prop_assert_eq!(&results[0], &results[1]);
        let blank: Vec<i32> = rows
            .iter()
            .filter(|r| matches!(r.cell(field), Cell::Missing | Cell::Null) || *r.cell(field) == Cell::Str(String::new()))
            .map(|r| r.id)
            .collect();
        prop_assert_eq!(&results[0], &blank);
    }
}
