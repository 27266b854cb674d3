use crate::commands::Context;
use crate::enrollment::{Driver, EnrollmentManager, Transition};
use crate::error::Result;
use crate::git::GitRepo;

fn manager() -> Result<EnrollmentManager> {
    let repo = GitRepo::open(".")?;
    let context = Context::load()?;
    EnrollmentManager::new(repo, Driver::from_settings(&context.settings))
}

/// Route credentials files through this tool for diff and merge
pub fn enroll() -> Result<()> {
    let manager = manager()?;

    match manager.enroll()? {
        Transition::Unchanged => println!("Already enrolled."),
        Transition::Applied => {
            println!("Enrolled project in credentials diffing and merging!");
            println!(
                "\nCommit {} so collaborators pick it up, then run 'enc-creds diff --enroll' in their clones.",
                manager.attributes_path().display()
            );
        }
    }

    Ok(())
}

/// Undo [`enroll`]
pub fn disenroll() -> Result<()> {
    match manager()?.disenroll()? {
        Transition::Unchanged => println!("Not enrolled."),
        Transition::Applied => println!("Disenrolled project from credentials diffing and merging."),
    }

    Ok(())
}
