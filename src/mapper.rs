use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::error::{new_convert_error, new_error, ErrorKind, Result};
use crate::reader::{FieldCount, ReaderBuilder};
use crate::value::{FieldDecode, FieldEncode, Kind, ValueError};
use crate::writer::WriterBuilder;

/// A record type that can be bound to CSV columns.
///
/// The implementation plays the role of a tag block: it names each bound
/// field and supplies its accessors. Fields that are not declared are
/// skipped entirely.
///
/// ```
/// use fastcsv::{SchemaBuilder, Tabular};
///
/// #[derive(Default)]
/// struct City {
///     name: String,
///     population: u64,
/// }
///
/// impl Tabular for City {
///     fn schema(schema: &mut SchemaBuilder<Self>) {
///         schema.field("name", |c: &City| &c.name, |c: &mut City| &mut c.name);
///         schema.field(
///             "population",
///             |c: &City| &c.population,
///             |c: &mut City| &mut c.population,
///         );
///     }
/// }
/// ```
pub trait Tabular: Default + 'static {
    /// Declare the CSV bindings for this record type.
    fn schema(schema: &mut SchemaBuilder<Self>);
}

type SetFn<T> =
    Arc<dyn Fn(&mut T, &[u8]) -> std::result::Result<(), ValueError> + Send + Sync>;
type GetFn<T> = Arc<dyn Fn(&T, &mut Vec<u8>) + Send + Sync>;
type EmptyFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

struct FieldBinding<T> {
    name: String,
    folded: String,
    kind: Kind,
    omit_empty: bool,
    split: Option<u8>,
    set: SetFn<T>,
    get: GetFn<T>,
    is_empty: EmptyFn<T>,
}

/// Collects the field bindings of one record type.
pub struct SchemaBuilder<T> {
    bindings: Vec<FieldBinding<T>>,
}

impl<T: 'static> SchemaBuilder<T> {
    fn new() -> SchemaBuilder<T> {
        SchemaBuilder { bindings: Vec::new() }
    }

    /// Bind a field under the given CSV name.
    ///
    /// Names must be unique after case-folding; a duplicate is a
    /// programmer error and panics at descriptor build.
    pub fn field<V>(
        &mut self,
        name: &str,
        get: fn(&T) -> &V,
        set: fn(&mut T) -> &mut V,
    ) -> FieldOpts<'_, T>
    where
        V: FieldDecode + FieldEncode + 'static,
    {
        let set_fn: SetFn<T> = Arc::new(move |record, raw| {
            *set(record) = V::decode_field(raw)?;
            Ok(())
        });
        let get_fn: GetFn<T> =
            Arc::new(move |record, out| get(record).encode_field(out));
        let empty_fn: EmptyFn<T> =
            Arc::new(move |record| get(record).is_empty_field());
        self.push(name.to_string(), V::KIND, None, false, set_fn, get_fn, empty_fn)
    }

    /// Bind a list field, splitting the cell on `separator`.
    ///
    /// The split applies to the decoded cell; an empty cell is an empty
    /// list.
    pub fn split_field<V>(
        &mut self,
        name: &str,
        separator: u8,
        get: fn(&T) -> &Vec<V>,
        set: fn(&mut T) -> &mut Vec<V>,
    ) -> FieldOpts<'_, T>
    where
        V: FieldDecode + FieldEncode + 'static,
    {
        let set_fn: SetFn<T> = Arc::new(move |record, raw| {
            let list = set(record);
            list.clear();
            if raw.is_empty() {
                return Ok(());
            }
            for part in raw.split(|&b| b == separator) {
                list.push(V::decode_field(part)?);
            }
            Ok(())
        });
        let get_fn: GetFn<T> = Arc::new(move |record, out| {
            for (i, item) in get(record).iter().enumerate() {
                if i > 0 {
                    out.push(separator);
                }
                item.encode_field(out);
            }
        });
        let empty_fn: EmptyFn<T> =
            Arc::new(move |record| get(record).is_empty());
        self.push(
            name.to_string(),
            Kind::List,
            Some(separator),
            false,
            set_fn,
            get_fn,
            empty_fn,
        )
    }

    /// Inline the bindings of an embedded record, composing accessors.
    ///
    /// The embedded type's columns keep their own names and options.
    pub fn nested<V: Tabular>(
        &mut self,
        get: fn(&T) -> &V,
        set: fn(&mut T) -> &mut V,
    ) {
        let inner = descriptor::<V>();
        for binding in &inner.bindings {
            let inner_set = Arc::clone(&binding.set);
            let inner_get = Arc::clone(&binding.get);
            let inner_empty = Arc::clone(&binding.is_empty);
            let set_fn: SetFn<T> =
                Arc::new(move |record, raw| inner_set(set(record), raw));
            let get_fn: GetFn<T> =
                Arc::new(move |record, out| inner_get(get(record), out));
            let empty_fn: EmptyFn<T> =
                Arc::new(move |record| inner_empty(get(record)));
            self.push(
                binding.name.clone(),
                binding.kind,
                binding.split,
                binding.omit_empty,
                set_fn,
                get_fn,
                empty_fn,
            );
        }
    }

    fn push(
        &mut self,
        name: String,
        kind: Kind,
        split: Option<u8>,
        omit_empty: bool,
        set: SetFn<T>,
        get: GetFn<T>,
        is_empty: EmptyFn<T>,
    ) -> FieldOpts<'_, T> {
        let folded = name.to_lowercase();
        if self.bindings.iter().any(|b| b.folded == folded) {
            panic!("fastcsv: duplicate CSV column name `{}`", name);
        }
        self.bindings.push(FieldBinding {
            name,
            folded,
            kind,
            omit_empty,
            split,
            set,
            get,
            is_empty,
        });
        let last = self.bindings.len() - 1;
        FieldOpts { binding: &mut self.bindings[last] }
    }
}

/// Per-binding options, returned by the binding methods.
pub struct FieldOpts<'a, T> {
    binding: &'a mut FieldBinding<T>,
}

impl<'a, T> FieldOpts<'a, T> {
    /// Emit an empty cell when the value is empty. The column itself is
    /// always present; this never suppresses it.
    pub fn omit_empty(self) -> FieldOpts<'a, T> {
        self.binding.omit_empty = true;
        self
    }
}

/// The precomputed bindings of one record type.
///
/// Built once per type on first use and cached process-wide.
pub struct Descriptor<T> {
    bindings: Vec<FieldBinding<T>>,
    emit_order: Vec<usize>,
}

impl<T: Tabular> Descriptor<T> {
    fn build() -> Descriptor<T> {
        let mut schema = SchemaBuilder::new();
        T::schema(&mut schema);
        let bindings = schema.bindings;
        let mut emit_order: Vec<usize> = (0..bindings.len()).collect();
        emit_order.sort_by(|&a, &b| bindings[a].name.cmp(&bindings[b].name));
        Descriptor { bindings, emit_order }
    }
}

impl<T> Descriptor<T> {
    /// The number of bound columns.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// True if the type binds no columns.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// CSV names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.name.as_str())
    }

    /// The header row this type emits: names sorted lexicographically.
    pub fn header(&self) -> Vec<&str> {
        self.emit_order
            .iter()
            .map(|&i| self.bindings[i].name.as_str())
            .collect()
    }
}

type AnyArc = Arc<dyn Any + Send + Sync>;
type Plan = Vec<Option<usize>>;

#[derive(Eq, Hash, PartialEq)]
struct PlanKey {
    type_id: TypeId,
    header: Vec<Vec<u8>>,
}

static DESCRIPTORS: Lazy<RwLock<HashMap<TypeId, AnyArc>>> =
    Lazy::new(Default::default);
static PLANS: Lazy<RwLock<HashMap<PlanKey, Arc<Plan>>>> =
    Lazy::new(Default::default);

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    // A poisoned cache only means a descriptor build panicked; the map
    // itself is still coherent.
    match lock.read() {
        Ok(guard) => guard,
        Err(poison) => poison.into_inner(),
    }
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poison) => poison.into_inner(),
    }
}

/// The cached descriptor of `T`, building it on first use.
pub fn descriptor<T: Tabular>() -> Arc<Descriptor<T>> {
    let id = TypeId::of::<T>();
    if let Some(cached) = read_lock(&DESCRIPTORS).get(&id) {
        if let Ok(desc) = Arc::clone(cached).downcast::<Descriptor<T>>() {
            return desc;
        }
    }
    // Build outside the lock; a racing duplicate build is benign and the
    // first insert wins.
    let built = Arc::new(Descriptor::<T>::build());
    let mut map = write_lock(&DESCRIPTORS);
    let entry = map
        .entry(id)
        .or_insert_with(|| Arc::clone(&built) as AnyArc);
    match Arc::clone(entry).downcast::<Descriptor<T>>() {
        Ok(desc) => desc,
        Err(_) => built,
    }
}

/// The cached column plan for `T` against this exact header row.
fn plan_for<T: Tabular>(desc: &Descriptor<T>, header: &[Vec<u8>]) -> Arc<Plan> {
    let key =
        PlanKey { type_id: TypeId::of::<T>(), header: header.to_vec() };
    if let Some(plan) = read_lock(&PLANS).get(&key) {
        return Arc::clone(plan);
    }
    let plan: Plan = header
        .iter()
        .map(|cell| {
            let folded = String::from_utf8_lossy(cell).to_lowercase();
            desc.bindings.iter().position(|b| b.folded == folded)
        })
        .collect();
    let plan = Arc::new(plan);
    Arc::clone(write_lock(&PLANS).entry(key).or_insert(plan))
}

/// Empty the descriptor and plan caches. Intended for tests and
/// hot-reload scenarios.
pub(crate) fn clear() {
    write_lock(&DESCRIPTORS).clear();
    write_lock(&PLANS).clear();
}

/// Parse `data` into typed records with the default configuration.
///
/// The first record is the header row; columns bind to fields by
/// case-insensitive name, unmatched columns are ignored, and rows are held
/// to the header's field count.
pub fn unmarshal<T: Tabular>(data: &[u8]) -> Result<Vec<T>> {
    unmarshal_with(&ReaderBuilder::new(), data)
}

/// Parse `data` into typed records with a configured reader.
pub fn unmarshal_with<T: Tabular>(
    builder: &ReaderBuilder,
    data: &[u8],
) -> Result<Vec<T>> {
    let mut builder = builder.clone();
    if builder.field_count_policy() == FieldCount::Any {
        builder.field_count(FieldCount::FirstRecord);
    }
    let desc = descriptor::<T>();
    let mut rdr = builder.from_slice(data)?;
    let header: Vec<Vec<u8>> = match rdr.read_view()? {
        None => return Ok(Vec::new()),
        Some(view) => view.iter().map(|f| f.bytes().into_owned()).collect(),
    };
    let plan = plan_for(&desc, &header);
    let mut out = Vec::new();
    loop {
        let view = match rdr.read_view()? {
            None => break,
            Some(view) => view,
        };
        let line = view.position().line();
        let mut record = T::default();
        for (col, field) in view.iter().enumerate() {
            let binding = match plan.get(col).copied().flatten() {
                None => continue,
                Some(i) => &desc.bindings[i],
            };
            // Decode lazily: unmatched columns never resolve escapes.
            let raw = field.bytes();
            (binding.set)(&mut record, &raw).map_err(|err| {
                new_error(ErrorKind::Convert(new_convert_error(
                    line,
                    col as u64 + 1,
                    &binding.name,
                    err,
                )))
            })?;
        }
        out.push(record);
    }
    Ok(out)
}

/// Parse `data` into the raw sequence-of-sequence-of-string shape.
///
/// All records are returned, the header row included; no binding is
/// applied.
pub fn unmarshal_raw(data: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut rdr = ReaderBuilder::new().from_slice(data)?;
    let mut out = Vec::new();
    loop {
        let view = match rdr.read_view()? {
            None => break,
            Some(view) => view,
        };
        let mut row = Vec::with_capacity(view.len());
        for field in view.iter() {
            row.push(field.as_str()?.into_owned());
        }
        out.push(row);
    }
    Ok(out)
}

/// Render typed records to CSV bytes with the default configuration.
///
/// The header row holds the type's CSV names sorted lexicographically;
/// every row emits all columns in that order.
pub fn marshal<T: Tabular>(records: &[T]) -> Result<Vec<u8>> {
    marshal_with(&WriterBuilder::new(), records)
}

/// Render typed records to CSV bytes with a configured writer.
pub fn marshal_with<T: Tabular>(
    builder: &WriterBuilder,
    records: &[T],
) -> Result<Vec<u8>> {
    let desc = descriptor::<T>();
    let mut wtr = builder.from_writer(Vec::new())?;
    wtr.write_record(
        desc.emit_order.iter().map(|&i| desc.bindings[i].name.as_bytes()),
    )?;
    let mut cells: Vec<Vec<u8>> = vec![Vec::new(); desc.emit_order.len()];
    for record in records {
        for (slot, &i) in desc.emit_order.iter().enumerate() {
            let binding = &desc.bindings[i];
            cells[slot].clear();
            if !(binding.omit_empty && (binding.is_empty)(record)) {
                (binding.get)(record, &mut cells[slot]);
            }
        }
        wtr.write_record(&cells)?;
    }
    wtr.into_inner().map_err(|err| err.into_error().into())
}

#[cfg(test)]
mod tests {
    use super::{
        descriptor, marshal, marshal_with, unmarshal, unmarshal_raw,
        unmarshal_with, SchemaBuilder, Tabular,
    };
    use crate::error::ErrorKind;
    use crate::reader::{OnBadLine, ReaderBuilder};
    use crate::value::{FieldDecode, FieldEncode, ValueError};
    use crate::writer::WriterBuilder;

    #[derive(Debug, Default, PartialEq)]
    struct Person {
        name: String,
        age: u32,
        email: Option<String>,
        admin: bool,
        score: f64,
    }

    impl Tabular for Person {
        fn schema(schema: &mut SchemaBuilder<Self>) {
            schema.field(
                "name",
                |p: &Person| &p.name,
                |p: &mut Person| &mut p.name,
            );
            schema.field("age", |p: &Person| &p.age, |p: &mut Person| {
                &mut p.age
            });
            schema
                .field(
                    "email",
                    |p: &Person| &p.email,
                    |p: &mut Person| &mut p.email,
                )
                .omit_empty();
            schema.field(
                "admin",
                |p: &Person| &p.admin,
                |p: &mut Person| &mut p.admin,
            );
            schema.field(
                "score",
                |p: &Person| &p.score,
                |p: &mut Person| &mut p.score,
            );
        }
    }

    fn person(
        name: &str,
        age: u32,
        email: Option<&str>,
        admin: bool,
        score: f64,
    ) -> Person {
        Person {
            name: name.to_string(),
            age,
            email: email.map(str::to_string),
            admin,
            score,
        }
    }

    #[test]
    fn unmarshal_binds_by_header_name() {
        let data = b"name,age,admin\nAlice,30,yes\nBob,25,0\n";
        let people: Vec<Person> = unmarshal(data).unwrap();
        assert_eq!(
            people,
            vec![
                person("Alice", 30, None, true, 0.0),
                person("Bob", 25, None, false, 0.0),
            ]
        );
    }

    #[test]
    fn header_match_is_case_insensitive_and_order_free() {
        let data = b"AGE,Name\n42,Zed\n";
        let people: Vec<Person> = unmarshal(data).unwrap();
        assert_eq!(people, vec![person("Zed", 42, None, false, 0.0)]);
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let data = b"name,shoe_size,age\nEve,38,29\n";
        let people: Vec<Person> = unmarshal(data).unwrap();
        assert_eq!(people, vec![person("Eve", 29, None, false, 0.0)]);
    }

    #[test]
    fn empty_cells_take_zero_values() {
        let data = b"name,age,email,admin,score\nN,,,,\n";
        let people: Vec<Person> = unmarshal(data).unwrap();
        assert_eq!(people, vec![person("N", 0, None, false, 0.0)]);
    }

    #[test]
    fn conversion_failure_is_fatal_and_positioned() {
        let data = b"name,age\nAlice,old\n";
        let err = unmarshal::<Person>(data).unwrap_err();
        match err.into_kind() {
            ErrorKind::Convert(convert) => {
                assert_eq!(convert.field(), "age");
                assert_eq!(convert.line(), 2);
                assert_eq!(convert.column(), 2);
            }
            kind => panic!("unexpected kind: {:?}", kind),
        }
    }

    #[test]
    fn ragged_rows_are_rejected_by_default() {
        let data = b"name,age\nAlice\n";
        assert!(unmarshal::<Person>(data).is_err());
    }

    #[test]
    fn composes_with_bad_line_skip() {
        let data = b"name,age\nAlice,30\noops\nBob,25\n";
        let people: Vec<Person> = unmarshal_with(
            ReaderBuilder::new().on_bad_line(OnBadLine::Skip),
            data,
        )
        .unwrap();
        assert_eq!(people.len(), 2);
    }

    #[test]
    fn marshal_emits_sorted_header_and_all_columns() {
        let people = vec![person("Ann", 31, Some("a@x.io"), false, 1.5)];
        let out = marshal(&people).unwrap();
        assert_eq!(
            std::str::from_utf8(&out).unwrap(),
            "admin,age,email,name,score\nfalse,31,a@x.io,Ann,1.5\n"
        );
    }

    #[test]
    fn omit_empty_writes_empty_cell_not_fewer_columns() {
        let people = vec![person("Ann", 31, None, false, 1.5)];
        let out = marshal(&people).unwrap();
        assert_eq!(
            std::str::from_utf8(&out).unwrap(),
            "admin,age,email,name,score\nfalse,31,,Ann,1.5\n"
        );
    }

    #[test]
    fn marshal_unmarshal_marshal_is_identity() {
        let people = vec![
            person("Ann, the first", 31, Some("a@x.io"), true, 1.5),
            person("B\"ob", 0, None, false, 0.25),
        ];
        let once = marshal(&people).unwrap();
        let round: Vec<Person> = unmarshal(&once).unwrap();
        let twice = marshal(&round).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn marshal_with_crlf() {
        let people = vec![person("A", 1, None, false, 0.0)];
        let out = marshal_with(
            WriterBuilder::new().use_crlf(true),
            &people,
        )
        .unwrap();
        assert!(out.ends_with(b"\r\n"));
    }

    #[test]
    fn unmarshal_raw_keeps_all_rows() {
        let rows = unmarshal_raw(b"h1,h2\na,\"b,c\"\n").unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["h1".to_string(), "h2".to_string()],
                vec!["a".to_string(), "b,c".to_string()],
            ]
        );
    }

    #[derive(Debug, Default, PartialEq)]
    struct Tagged {
        id: u64,
        tags: Vec<String>,
    }

    impl Tabular for Tagged {
        fn schema(schema: &mut SchemaBuilder<Self>) {
            schema.field("id", |t: &Tagged| &t.id, |t: &mut Tagged| {
                &mut t.id
            });
            schema.split_field(
                "tags",
                b'|',
                |t: &Tagged| &t.tags,
                |t: &mut Tagged| &mut t.tags,
            );
        }
    }

    #[test]
    fn split_field_round_trip() {
        let data = b"id,tags\n7,red|green|blue\n8,\n";
        let tagged: Vec<Tagged> = unmarshal(data).unwrap();
        assert_eq!(
            tagged,
            vec![
                Tagged {
                    id: 7,
                    tags: vec![
                        "red".to_string(),
                        "green".to_string(),
                        "blue".to_string()
                    ],
                },
                Tagged { id: 8, tags: vec![] },
            ]
        );
        let out = marshal(&tagged).unwrap();
        assert_eq!(
            std::str::from_utf8(&out).unwrap(),
            "id,tags\n7,red|green|blue\n8,\n"
        );
    }

    #[derive(Debug, Default, PartialEq)]
    struct Address {
        city: String,
        zip: String,
    }

    impl Tabular for Address {
        fn schema(schema: &mut SchemaBuilder<Self>) {
            schema.field(
                "city",
                |a: &Address| &a.city,
                |a: &mut Address| &mut a.city,
            );
            schema.field("zip", |a: &Address| &a.zip, |a: &mut Address| {
                &mut a.zip
            });
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Customer {
        id: u64,
        address: Address,
    }

    impl Tabular for Customer {
        fn schema(schema: &mut SchemaBuilder<Self>) {
            schema.field("id", |c: &Customer| &c.id, |c: &mut Customer| {
                &mut c.id
            });
            schema.nested(
                |c: &Customer| &c.address,
                |c: &mut Customer| &mut c.address,
            );
        }
    }

    #[test]
    fn nested_bindings_flatten() {
        let data = b"id,city,zip\n1,Berlin,10115\n";
        let customers: Vec<Customer> = unmarshal(data).unwrap();
        assert_eq!(
            customers,
            vec![Customer {
                id: 1,
                address: Address {
                    city: "Berlin".to_string(),
                    zip: "10115".to_string(),
                },
            }]
        );
        let out = marshal(&customers).unwrap();
        assert_eq!(
            std::str::from_utf8(&out).unwrap(),
            "city,id,zip\nBerlin,1,10115\n"
        );
    }

    #[derive(Debug, Default, PartialEq)]
    struct Hex(u32);

    impl FieldDecode for Hex {
        fn decode_field(raw: &[u8]) -> Result<Hex, ValueError> {
            let s = std::str::from_utf8(raw)
                .map_err(|_| ValueError::message("hex", "not UTF-8"))?;
            u32::from_str_radix(s.trim_start_matches("0x"), 16)
                .map(Hex)
                .map_err(|_| ValueError::message("hex", "bad digits"))
        }
    }

    impl FieldEncode for Hex {
        fn encode_field(&self, out: &mut Vec<u8>) {
            out.extend_from_slice(format!("0x{:x}", self.0).as_bytes());
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Machine {
        addr: Hex,
    }

    impl Tabular for Machine {
        fn schema(schema: &mut SchemaBuilder<Self>) {
            schema.field(
                "addr",
                |m: &Machine| &m.addr,
                |m: &mut Machine| &mut m.addr,
            );
        }
    }

    #[test]
    fn custom_conversions_are_trusted() {
        let machines: Vec<Machine> =
            unmarshal(b"addr\n0xff\n").unwrap();
        assert_eq!(machines, vec![Machine { addr: Hex(255) }]);
        let out = marshal(&machines).unwrap();
        assert_eq!(std::str::from_utf8(&out).unwrap(), "addr\n0xff\n");
    }

    // One sequential test covers caching, introspection and clearing;
    // splitting it would let a concurrent clear race the pointer checks.
    #[derive(Debug, Default)]
    struct CacheProbe {
        x: String,
    }

    impl Tabular for CacheProbe {
        fn schema(schema: &mut SchemaBuilder<Self>) {
            schema.field(
                "x",
                |p: &CacheProbe| &p.x,
                |p: &mut CacheProbe| &mut p.x,
            );
        }
    }

    #[test]
    fn descriptor_is_cached_and_clearable() {
        let first = descriptor::<CacheProbe>();
        let second = descriptor::<CacheProbe>();
        assert!(std::sync::Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);
        assert_eq!(first.names().collect::<Vec<_>>(), vec!["x"]);

        crate::clear_caches();
        let rebuilt = descriptor::<CacheProbe>();
        assert!(!std::sync::Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(rebuilt.len(), 1);
    }

    #[test]
    fn descriptor_header_is_sorted() {
        assert_eq!(
            descriptor::<Person>().header(),
            vec!["admin", "age", "email", "name", "score"]
        );
    }

    #[test]
    fn plans_survive_distinct_header_orders() {
        let a: Vec<Person> = unmarshal(b"name,age\nA,1\n").unwrap();
        let b: Vec<Person> = unmarshal(b"age,name\n2,B\n").unwrap();
        assert_eq!(a[0].name, "A");
        assert_eq!(a[0].age, 1);
        assert_eq!(b[0].name, "B");
        assert_eq!(b[0].age, 2);
    }

    #[derive(Debug, Default)]
    struct Clashing {
        a: String,
        b: String,
    }

    impl Tabular for Clashing {
        fn schema(schema: &mut SchemaBuilder<Self>) {
            schema.field("Name", |c: &Clashing| &c.a, |c: &mut Clashing| {
                &mut c.a
            });
            schema.field("name", |c: &Clashing| &c.b, |c: &mut Clashing| {
                &mut c.b
            });
        }
    }

    #[test]
    #[should_panic(expected = "duplicate CSV column name")]
    fn duplicate_folded_names_panic() {
        let _ = descriptor::<Clashing>();
    }
}
