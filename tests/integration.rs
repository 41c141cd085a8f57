//! Integration tests for composed pipelines

use std::collections::HashSet;
use std::time::Duration;

use conduitweld::prelude::*;
use conduitweld::util::{try_collect, try_stream_into_vec};
use futures::stream;
use tokio_test::{assert_err, assert_ok};

fn add(n: i64) -> Transformer<i64, i64> {
    Transformer::new(MapTransformer::new(move |x: i64| x + n))
}

/// Identity stage with custom semantic tags
struct Tagged {
    input: &'static str,
    product: &'static str,
}

impl Transform for Tagged {
    type Input = i64;
    type Output = i64;

    fn name(&self) -> String {
        format!("{}To{}", self.input, self.product)
    }

    fn input_type(&self) -> TypeTag {
        TypeTag::new(self.input)
    }

    fn product_type(&self) -> TypeTag {
        TypeTag::new(self.product)
    }

    fn transform(&self, item: i64) -> Result<Vec<i64>> {
        Ok(vec![item])
    }
}

fn numbers() -> TypeHierarchy {
    TypeHierarchy::new()
        .declare("Integer", "Number")
        .declare("Natural", "Integer")
}

#[test]
fn test_final_conduits_terminate_on_deep_composites() {
    let branch = |n| add(n).then(add(n)).with_branch(add(-n)).unwrap();
    let pipeline = Producer::from_items(vec![1i64, 2])
        .with_branch(Producer::new(RangeProducer::new(0..2)))
        .then(branch(1))
        .then(branch(2))
        .then(add(3));

    let finals = pipeline.final_conduits();
    assert_eq!(finals.len(), 1);

    let topology = Topology::of(&pipeline);
    let nodes = topology.nodes();
    let unique: HashSet<_> = nodes.iter().map(|n| n.id).collect();
    assert_eq!(unique.len(), nodes.len());
    // two sources, two groups of three stages, one tail
    assert_eq!(nodes.len(), 9);
    assert!(topology.isolated.is_empty());
}

#[test]
fn test_passthrough_propagates_source_finals() {
    let source = Producer::from_items(vec![1i64, 2]);
    let stage = add(10);
    let source_ref = source.final_conduit().unwrap();
    let stage_ref = stage.final_conduit().unwrap();

    let group = assert_ok!(stage.with_passthrough());
    assert!(group.has_passthrough());
    assert_eq!(group.final_conduits(), vec![stage_ref.clone()]);

    let chain = source.then(group);
    assert!(!chain.has_passthrough());
    assert_eq!(
        chain.final_conduits(),
        vec![source_ref.clone(), stage_ref.clone()]
    );
    assert_eq!(
        chain.connections(&[]),
        vec![Connection::new(source_ref, stage_ref)]
    );

    let items = assert_ok!(try_collect(chain.produce()));
    assert_eq!(items, vec![11, 12, 1, 2]);
}

#[test]
fn test_passthrough_first_is_enumerated_first() {
    let group = assert_ok!(Passthrough.with_branch(add(10)));
    assert_eq!(
        group.to_expression().to_string(),
        "passthrough & MapTransformer"
    );

    let chain = Producer::from_items(vec![1i64]).then(group);
    let items = assert_ok!(try_collect(chain.produce()));
    assert_eq!(items, vec![1, 11]);
}

#[test]
fn test_passthrough_source_feeds_downstream_stage() {
    let source = Producer::from_items(vec![9i64, 10]);
    let first = add(1);
    let second = add(2);
    let source_ref = source.final_conduit().unwrap();
    let first_ref = first.final_conduit().unwrap();
    let second_ref = second.final_conduit().unwrap();

    let bypass = assert_ok!(first.with_passthrough()).then(second);
    assert!(!bypass.has_passthrough());

    let chain = source.then(bypass);
    assert_eq!(
        chain.connections(&[]),
        vec![
            Connection::new(source_ref.clone(), first_ref.clone()),
            Connection::new(first_ref, second_ref.clone()),
            Connection::new(source_ref, second_ref.clone()),
        ]
    );
    assert_eq!(chain.final_conduits(), vec![second_ref]);

    let items = assert_ok!(try_collect(chain.produce()));
    assert_eq!(items, vec![12, 13, 11, 12]);
}

#[test]
fn test_chained_passthrough_groups_pass_through() {
    let source = Producer::from_items(vec![1i64]);
    let head = assert_ok!(add(1).with_passthrough());
    let tail = assert_ok!(add(2).with_passthrough());
    let stage_refs = [head.final_conduits(), tail.final_conduits()].concat();

    let both = head.then(tail);
    assert!(both.has_passthrough());

    let source_ref = source.final_conduit().unwrap();
    let chain = source.then(both);
    assert!(!chain.has_passthrough());

    let mut expected = vec![source_ref];
    expected.extend(stage_refs);
    assert_eq!(chain.final_conduits(), expected);

    let items = assert_ok!(try_collect(chain.produce()));
    assert_eq!(items, vec![4, 2, 3, 1]);
}

#[test]
fn test_sync_group_concatenates() {
    let group = Producer::from_items(vec![1, 2])
        .with_branch(Producer::from_items(vec![3, 4]));
    let items = assert_ok!(try_collect(group.produce()));
    assert_eq!(items, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_async_group_interleaves_without_loss() {
    let fast = IntervalProducer::new(IterProducer::new(vec![1, 2, 3]), Duration::from_millis(3));
    let slow = IntervalProducer::new(IterProducer::new(vec![10, 20]), Duration::from_millis(7));
    let group = Producer::new(slow).with_branch(Producer::new(fast));

    let mut items = assert_ok!(try_stream_into_vec(group.aproduce()).await);
    items.sort();
    assert_eq!(items, vec![1, 2, 3, 10, 20]);
}

#[test]
fn test_transform_flattens_expansions() {
    let double = Transformer::new(FlatMapTransformer::new(|x: i64| vec![x, x]));
    let input: Products<i64> = Box::new(vec![1i64, 2].into_iter().map(Ok::<_, Error>));
    let items = assert_ok!(try_collect(double.process(input)));
    assert_eq!(items, vec![1, 1, 2, 2]);
}

#[test]
fn test_passthrough_rejects_widening_stage() {
    let lattice = numbers();
    let widening = Transformer::new(Tagged {
        input: "Number",
        product: "Integer",
    });

    let err = assert_err!(widening.clone().with_passthrough_in(&lattice));
    assert!(matches!(err, Error::PassthroughType { .. }));
    assert!(err.is_composition_error());

    let err = assert_err!(Passthrough.with_branch_in(widening, &lattice));
    assert!(matches!(err, Error::PassthroughType { .. }));

    let narrowing = Transformer::new(Tagged {
        input: "Natural",
        product: "Number",
    });
    let group = assert_ok!(narrowing.with_passthrough_in(&lattice));
    assert_eq!(group.input_type(), Some(TypeTag::new("Natural")));
    assert_eq!(group.product_type(), TypeTag::new("Number"));
}

#[test]
fn test_group_input_narrows_to_common_descendant() {
    let lattice = numbers();
    let left = Transformer::new(Tagged {
        input: "Integer",
        product: "Integer",
    });
    let right = Transformer::new(Tagged {
        input: "Natural",
        product: "Number",
    });
    let group = assert_ok!(left.with_branch_in(right, &lattice));
    assert_eq!(group.input_type(), Some(TypeTag::new("Natural")));
    assert_eq!(group.product_type(), TypeTag::new("Number"));

    let text = Transformer::new(Tagged {
        input: "Text",
        product: "Text",
    });
    let err = assert_err!(group.with_branch_in(text, &lattice));
    assert!(matches!(err, Error::NoCommonSubtype { .. }));
}

#[test]
fn test_connections_are_idempotent() {
    let pipeline = Producer::from_items(vec![1i64])
        .with_branch(Producer::from_items(vec![2]))
        .then(add(1).with_branch(add(2)).unwrap())
        .then(add(3).with_passthrough().unwrap());

    let first = pipeline.connections(&[]);
    let second = pipeline.connections(&[]);
    assert_eq!(first, second);
    assert_eq!(first.len(), 4 + 2);
    assert_eq!(pipeline.final_conduits(), pipeline.final_conduits());
}

#[test]
fn test_group_materialises_one_shot_input() {
    let group = add(10).with_branch(add(100)).unwrap();
    let one_shot: Products<i64> = Box::new(vec![1i64, 2, 3].into_iter().map(Ok::<_, Error>));
    let items = assert_ok!(try_collect(group.process(one_shot)));
    assert_eq!(items, vec![11, 12, 13, 101, 102, 103]);
}

#[tokio::test]
async fn test_group_materialises_one_shot_stream() {
    let group = add(10).with_branch(add(100)).unwrap();
    let one_shot: ProductStream<i64> = Box::pin(stream::iter(vec![Ok::<_, Error>(1i64), Ok(2)]));
    let mut items = assert_ok!(try_stream_into_vec(group.aprocess(one_shot)).await);
    items.sort();
    assert_eq!(items, vec![11, 12, 101, 102]);
}

#[test]
fn test_group_upstream_error_ends_output() {
    let group = add(10).with_branch(add(100)).unwrap();
    let broken = vec![Ok(1i64), Err(Error::custom("upstream broke"))];
    let failing: Products<i64> = Box::new(broken.into_iter());
    let items: Vec<Result<i64>> = group.process(failing).collect();
    assert_eq!(items.len(), 1);
    match &items[0] {
        Err(Error::Custom(message)) => assert_eq!(message, "upstream broke"),
        other => panic!("unexpected item: {other:?}"),
    }
}

#[tokio::test]
async fn test_flow_runs_sync_and_async_alike() {
    let evens = Transformer::new(FilterTransformer::new(|x: &i64| x % 2 == 0));
    let pipeline = || {
        Producer::new(RangeProducer::new(0..20))
            .then(evens.clone())
            .then(add(1).with_passthrough().unwrap())
    };

    let sync_items = assert_ok!(pipeline().into_flow(CollectConsumer::new()).run_sync());
    let config = FlowConfig {
        batch_size: 4,
        operation_timeout: Some(Duration::from_secs(5)),
    };
    let flow = pipeline().into_flow(CollectConsumer::new());
    let mut async_items = assert_ok!(flow.config(config).run().await);

    let mut expected = sync_items.clone();
    expected.sort();
    async_items.sort();
    assert_eq!(async_items, expected);
    assert_eq!(sync_items.len(), 20);
}

#[tokio::test]
async fn test_flow_counts_group_products() {
    let group = Producer::new(RepeatProducer::times("x", 5))
        .with_branch(Producer::new(RepeatProducer::times("y", 3)));
    let flow = group.into_flow(CountConsumer::new()).batch_size(2);
    let count = assert_ok!(flow.run().await);
    assert_eq!(count, 8);
}

#[tokio::test]
async fn test_flow_surfaces_stage_errors() {
    let parse = Transformer::new(TryMapTransformer::new(|s: String| {
        s.parse::<i64>().map_err(Error::transformer)
    }));
    let inputs = vec!["1".to_string(), "two".to_string()];
    let producer = Producer::from_items(inputs).then(parse);

    let err = assert_err!(producer.into_flow(CollectConsumer::new()).run().await);
    assert!(matches!(err, Error::Transformer(_)));
}

#[test]
fn test_flow_topology_and_expression() {
    let numbers = FnProducer::new(|| vec![Ok::<_, Error>(1i64), Ok(2)]);
    let source = Producer::new(numbers.named("numbers"));
    let flow = source
        .then(add(1).with_branch(add(2)).unwrap())
        .into_flow(CollectConsumer::new());

    assert_eq!(
        flow.to_expression().to_string(),
        "numbers >> (MapTransformer & MapTransformer) >> CollectConsumer"
    );

    let topology = flow.topology();
    assert_eq!(topology.connections.len(), 4);
    assert_eq!(topology.nodes().len(), 4);
    let rendered = topology.to_string();
    assert_eq!(rendered.lines().count(), 4);
    assert!(rendered.lines().all(|line| line.contains(" -> ")));
}
