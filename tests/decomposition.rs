#[cfg(feature = "integration")]
mod common;

#[cfg(all(feature = "integration", test))]
mod tests {
    use crate::common::{
        group_by_ordered_plan, group_by_plan, join_group_by_plan, shapes, Shape,
    };
    use mapreduce_planner::test_utils::plans::{chain_plan, join_plan};
    use mapreduce_planner::{
        decompose, output_location, BoundaryTree, Decomposition, JobConf, LogicalInput,
        NodeKind, NodeProperties, PlanTree, Result, StaticContext,
    };
    use object_store::path::Path;
    use std::sync::Arc;

    #[test]
    fn linear_plan_yields_one_job_per_boundary() -> Result<()> {
        for n in 1..=6 {
            let jobs = decompose(chain_plan(n)?)?;
            assert_eq!(jobs.len(), n);
            for (i, job) in jobs.iter().enumerate() {
                assert_eq!(job.seq, i);
                assert!(!job.is_multi_input());
                let expected: Vec<usize> = if i == 0 { vec![] } else { vec![i - 1] };
                assert_eq!(job.inputs(), &expected[..]);
            }
        }
        Ok(())
    }

    #[test]
    fn plan_without_boundary_is_a_single_job() -> Result<()> {
        let mut plan = PlanTree::new(NodeKind::End, NodeProperties::default());
        let filter = plan.add_child(
            plan.root(),
            NodeKind::Operator("filter".into()),
            NodeProperties::default(),
        )?;
        plan.add_child(filter, NodeKind::Scan { input: 0 }, NodeProperties::default())?;
        let size = plan.len();

        let jobs = decompose(plan)?;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].plan.len(), size);
        assert_eq!(jobs[0].boundary(), None);
        Ok(())
    }

    #[test]
    fn join_yields_one_job_per_branch_plus_the_join() -> Result<()> {
        for ways in 2..=5 {
            let jobs = decompose(join_plan(ways)?)?;
            assert_eq!(jobs.len(), ways + 1);

            let (join, branches) = jobs.split_last().unwrap();
            for (i, branch) in branches.iter().enumerate() {
                assert_eq!(branch.seq, i);
                assert!(!branch.is_multi_input());
                assert!(branch.inputs().is_empty());
                assert_eq!(branch.logical_inputs(), &[i]);
            }
            assert!(join.is_multi_input());
            assert_eq!(join.inputs(), (0..ways).collect::<Vec<_>>().as_slice());
            assert!(join.logical_inputs().is_empty());
        }
        Ok(())
    }

    #[test]
    fn nested_plans_are_decomposed_in_dependency_order() -> Result<()> {
        let shapes = shapes(3);
        assert!(shapes.len() > 100);
        for shape in shapes {
            let plan = shape.plan()?;
            let nodes = plan.len();
            let jobs = decompose(plan)?;
            assert_eq!(jobs.len(), shape.expected_jobs(), "{shape:?}");

            let mut consumed = vec![0; jobs.len()];
            for (i, job) in jobs.iter().enumerate() {
                assert_eq!(job.seq, i, "{shape:?}");
                for input in job.inputs() {
                    assert!(*input < job.seq, "{shape:?}: job {} reads {input}", job.seq);
                    consumed[*input] += 1;
                }
            }
            // every job but the last feeds exactly one later job
            let (last, others) = consumed.split_last().unwrap();
            assert_eq!(*last, 0, "{shape:?}");
            assert!(others.iter().all(|c| *c == 1), "{shape:?}");

            // nothing is lost, and each extraction left exactly one placeholder behind
            let total: usize = jobs.iter().map(|j| j.plan.len()).sum();
            assert_eq!(total, nodes + jobs.len() - 1, "{shape:?}");

            let final_job = jobs.last().unwrap();
            assert!(final_job.plan.kind(final_job.plan.root())?.is_terminal());
        }
        Ok(())
    }

    #[test]
    fn boundary_tree_size_matches_job_count() -> Result<()> {
        for shape in shapes(2) {
            let plan = shape.plan()?;
            let size = BoundaryTree::build(&plan)?.map_or(1, |tree| tree.size());
            let decomposition = Decomposition::new(plan)?;
            assert_eq!(decomposition.job_count(), size);
            assert_eq!(decomposition.count(), size, "{shape:?}");
        }
        Ok(())
    }

    #[test]
    fn group_by_with_a_single_boundary() -> Result<()> {
        let jobs = decompose(group_by_plan()?)?;
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert!(job.boundary().is_some());
        assert_eq!(job.logical_inputs(), &[0]);
        Ok(())
    }

    #[test]
    fn group_by_then_order_by() -> Result<()> {
        let jobs = decompose(group_by_ordered_plan()?)?;
        assert_eq!(jobs.len(), 2);

        // job 0 prepares and aggregates the groups, job 1 orders them
        let aggregation = &jobs[0];
        assert_eq!(aggregation.seq, 0);
        assert_eq!(aggregation.logical_inputs(), &[0]);
        let ordering = &jobs[1];
        assert_eq!(ordering.seq, 1);
        assert_eq!(ordering.inputs(), &[0]);

        let ctx = Arc::new(StaticContext::new(vec![LogicalInput::parse("l:file:/l")?]));
        let base = Path::from("out");
        let conf = JobConf::try_new(ordering, ctx, None, &base)?;
        assert_eq!(
            conf.inputs,
            vec![mapreduce_planner::JobInput::Job {
                seq: 0,
                location: output_location(&base, 0),
            }]
        );
        Ok(())
    }

    #[test]
    fn join_then_group_by() -> Result<()> {
        let jobs = decompose(join_group_by_plan()?)?;
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs.iter().map(|j| j.seq).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(!jobs[0].is_multi_input());
        assert!(!jobs[1].is_multi_input());
        assert!(jobs[2].is_multi_input());
        assert_eq!(jobs[2].inputs(), &[0, 1]);
        Ok(())
    }

    #[test]
    fn shapes_describe_their_job_count() {
        let join = Shape::Join(vec![Shape::chain(Shape::Scan), Shape::Scan]);
        assert_eq!(join.expected_jobs(), 3);
        assert_eq!(Shape::Scan.expected_jobs(), 1);
        assert_eq!(Shape::chain(Shape::chain(Shape::Scan)).expected_jobs(), 2);
    }
}
