use pagedb::catalog::Database;
use pagedb::common::{DbConfig, TransactionId};
use pagedb::execution::{
    collect_tuples, Aggregate, AggregateOp, Delete, Filter, Join, JoinPredicate, Op, Operator,
    Predicate, SeqScan,
};
use pagedb::tuple::{Field, Tuple, TupleDesc, Type};

fn main() -> pagedb::Result<()> {
    println!("Pagedb - heap storage and iterator execution in Rust");
    println!("====================================================\n");

    let dir = std::env::temp_dir().join(format!("pagedb-demo-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;

    let db = Database::new(DbConfig::new().with_page_size(512).with_buffer_pool_pages(16));
    println!("Page size {} bytes, buffer pool of {} pages\n", db.config().page_size(), db.config().buffer_pool_pages());

    let emp_schema = TupleDesc::builder()
        .field("id", Type::Int)
        .field("dept", Type::Int)
        .field("salary", Type::Int)
        .build_arc();
    let dept_schema = TupleDesc::builder()
        .field("id", Type::Int)
        .field("name", Type::Str)
        .build_arc();

    let emp = db.catalog().create_table("emp", dir.join("emp.dat"), emp_schema.clone())?;
    let dept = db.catalog().create_table("dept", dir.join("dept.dat"), dept_schema.clone())?;

    // Load some rows
    let tid = TransactionId::new();
    for (id, name) in [(1, "engineering"), (2, "sales"), (3, "support")] {
        let row = Tuple::from_fields(dept_schema.clone(), vec![Field::Int(id), Field::from(name)]);
        db.buffer_pool().insert_tuple(tid, dept, row)?;
    }
    for id in 0..40 {
        let row = Tuple::from_fields(
            emp_schema.clone(),
            vec![Field::Int(id), Field::Int(id % 3 + 1), Field::Int(1000 + id * 25)],
        );
        db.buffer_pool().insert_tuple(tid, emp, row)?;
    }
    db.buffer_pool().transaction_complete(tid, true)?;
    println!("Loaded 40 employees across {} pages", db.catalog().file(emp)?.num_pages()?);

    // Average salary per department name
    let tid = TransactionId::new();
    let join = Join::new(
        JoinPredicate::new(1, Op::Equals, 0),
        Box::new(SeqScan::new(&db, tid, emp, "e")?),
        Box::new(SeqScan::new(&db, tid, dept, "d")?),
    );
    let mut avg = Aggregate::new(Box::new(join), 2, Some(4), AggregateOp::Avg)?;
    avg.open()?;
    println!("\n{}", avg.schema());
    for row in collect_tuples(&mut avg)? {
        println!("  {}", row);
    }
    avg.close();

    // Delete the low earners
    let low = Filter::new(
        Predicate::new(2, Op::LessThan, 1250),
        Box::new(SeqScan::new(&db, tid, emp, "e")?),
    );
    let mut delete = Delete::new(tid, Box::new(low), &db);
    delete.open()?;
    println!("\nDeleted {} rows", delete.next()?);
    delete.close();
    db.buffer_pool().transaction_complete(tid, true)?;

    let tid = TransactionId::new();
    let mut count = Aggregate::new(Box::new(SeqScan::new(&db, tid, emp, "e")?), 0, None, AggregateOp::Count)?;
    count.open()?;
    println!("{} rows remain", count.next()?);
    db.buffer_pool().transaction_complete(tid, true)?;

    std::fs::remove_dir_all(&dir).ok();
    println!("\nDemo completed successfully!");
    Ok(())
}
