//! Level × subject cross product

use crate::types::{ClassroomDescriptor, ClassroomKey, LevelRow, SubjectRow};

/// One descriptor per (level, subject), levels outer and subjects inner.
///
/// Keys are unique as long as level IDs and subject IDs are unique within
/// their tabs, which the workbook reader enforces.
pub fn enumerate_classrooms(
    levels: &[LevelRow],
    subjects: &[SubjectRow],
    school_id: &str,
    school_year: &str,
) -> Vec<ClassroomDescriptor> {
    let mut descriptors = Vec::with_capacity(levels.len() * subjects.len());

    for level in levels {
        for subject in subjects {
            descriptors.push(ClassroomDescriptor {
                key: ClassroomKey {
                    school_id: school_id.to_string(),
                    school_year: school_year.to_string(),
                    level_id: level.level_id.clone(),
                    subject_id: subject.subject_id.clone(),
                },
                level_name: level.level_name.clone(),
                subject_name: subject.subject_name.clone(),
            });
        }
    }

    descriptors
}
