#[cfg(feature = "integration")]
mod common;

#[cfg(all(feature = "integration", test))]
mod tests {
    use crate::common::{shapes, Shape};
    use mapreduce_planner::test_utils::plans::{chain_plan, join_plan, tuple_types};
    use mapreduce_planner::{
        decompose, resolve, resolve_forwarded, JobPlan, NodeKind, Result, TaskRole,
    };

    fn assert_same_layout(job: &JobPlan) -> Result<()> {
        let producer = resolve(&job.plan, TaskRole::Producer)?;
        let consumer = resolve(&job.plan, TaskRole::Consumer)?;
        let (Some(producer), Some(consumer)) = (producer, consumer) else {
            assert!(job.boundary().is_none(), "{}", job.name());
            return Ok(());
        };
        assert_eq!(producer.tag_count(), consumer.tag_count(), "{}", job.name());
        assert_eq!(producer.is_multi_input(), consumer.is_multi_input());
        for tag in 0..producer.tag_count() {
            assert_eq!(producer.types(tag), consumer.types(tag), "{} tag {tag}", job.name());
            assert_eq!(producer.key_indexes(tag), consumer.key_indexes(tag));
        }
        Ok(())
    }

    #[test]
    fn producer_and_consumer_agree_on_every_tag() -> Result<()> {
        for shape in shapes(2) {
            for job in decompose(shape.plan()?)? {
                assert_same_layout(&job)?;
            }
        }
        Ok(())
    }

    #[test]
    fn join_layout_survives_extraction() -> Result<()> {
        let plan = join_plan(3)?;
        let before = resolve(&plan, TaskRole::Consumer)?.unwrap();

        let jobs = decompose(plan)?;
        let join = jobs.last().unwrap();
        let after = resolve(&join.plan, TaskRole::Producer)?.unwrap();
        assert_eq!(after.tag_count(), 3);
        for tag in 0..3 {
            assert_eq!(after.types(tag), before.types(tag));
            assert_eq!(after.key_indexes(tag), before.key_indexes(tag));
        }
        Ok(())
    }

    #[test]
    fn forwarded_output_matches_what_the_next_job_reads() -> Result<()> {
        let jobs = decompose(chain_plan(3)?)?;
        for pair in jobs.windows(2) {
            let written = resolve_forwarded(&pair[0].plan, pair[0].output_tag())?.unwrap();
            let read = resolve(&pair[1].plan, TaskRole::Producer)?.unwrap();
            assert_eq!(written.types(0), read.types(0));
            assert_eq!(written.key_indexes(0), read.key_indexes(0));
            assert_eq!(read.types(0), Some(&tuple_types()[..]));
        }
        assert!(resolve_forwarded(&jobs[2].plan, jobs[2].output_tag())?.is_none());
        Ok(())
    }

    #[test]
    fn branch_jobs_forward_their_tag() -> Result<()> {
        let jobs = decompose(Shape::Join(vec![Shape::Scan, Shape::Scan, Shape::Scan]).plan()?)?;
        let join = resolve(&jobs[3].plan, TaskRole::Producer)?.unwrap();
        for (tag, branch) in jobs[..3].iter().enumerate() {
            assert_eq!(branch.plan.kind(branch.plan.root())?, &NodeKind::PhaseOut);
            // a branch job has no boundary of its own
            assert!(resolve(&branch.plan, TaskRole::Producer)?.is_none());

            let written = resolve_forwarded(&branch.plan, branch.output_tag())?.unwrap();
            assert_eq!(written.types(tag), Some(&tuple_types()[..]), "branch {tag}");
            assert_eq!(written.types(tag), join.types(tag));
            assert_eq!(written.key_indexes(tag), join.key_indexes(tag));
        }
        Ok(())
    }

    #[test]
    fn every_job_writes_the_layout_its_reader_expects() -> Result<()> {
        for shape in shapes(2) {
            let jobs = decompose(shape.plan()?)?;
            for job in &jobs[..jobs.len() - 1] {
                let tag = job.output_tag();
                let reader = jobs
                    .iter()
                    .find(|j| j.inputs().contains(&job.seq))
                    .unwrap();
                let written = resolve_forwarded(&job.plan, tag)?.unwrap();
                let read = resolve(&reader.plan, TaskRole::Producer)?.unwrap();
                assert_eq!(written.types(tag), read.types(tag), "{shape:?} job {}", job.seq);
                assert_eq!(written.key_indexes(tag), read.key_indexes(tag));
                assert!(written.types(tag).is_some(), "{shape:?} job {}", job.seq);
            }
        }
        Ok(())
    }
}
