//! Tales bundled with the application

use crate::types::Story;

pub(super) fn tales() -> Vec<Story> {
    vec![
        Story::new(
            "tale-1",
            "Cinderella",
            "Charles Perrault",
            "Classic",
            "Once upon a time there lived a kind girl named Cinderella. Her stepmother \
             and stepsisters made her do all the work of the house.\n\n\
             One day an invitation arrived for a grand ball at the palace. Cinderella \
             was told she could not go, and she sat crying in the garden.\n\n\
             A soft light appeared, and there stood her Fairy Godmother! With a wave of \
             her wand a pumpkin became a golden coach and rags became a shining gown. \
             \"Return before midnight,\" she warned, \"for then the magic ends.\"\n\n\
             The prince danced with Cinderella all night. When the clock struck twelve \
             she fled, leaving only a glass slipper behind. The prince searched the whole \
             kingdom until he found the girl whose foot fit the slipper. They were married, \
             and Cinderella forgave her stepsisters.",
        )
        .with_summary("A kind girl finds her prince with the help of a fairy godmother.")
        .with_duration_label("6 min"),
        Story::new(
            "tale-2",
            "The Tortoise and the Hare",
            "Aesop",
            "Animals",
            "A hare once laughed at a tortoise for being so slow. \"Let us race,\" said the \
             tortoise, \"and we shall see who is slow.\"\n\n\
             The hare dashed ahead and was soon far out of sight. Sure of winning, he lay \
             down under a tree for a nap.\n\n\
             The tortoise kept walking, one steady step after another. When the hare woke \
             up, he ran as fast as he could. But the tortoise was already crossing the \
             finish line! Slow and steady wins the race.",
        )
        .with_summary("A patient tortoise teaches a boastful hare a lesson.")
        .with_duration_label("4 min"),
        Story::new(
            "tale-3",
            "The Little Star",
            "Fabletime",
            "Dreams",
            "High above the sleeping village lived a little star who could not shine. \
             Every night she tried her very best, but only a faint flicker came out.\n\n\
             An old owl noticed her and asked why she looked so sad. \"I want to light the \
             way for children who are afraid of the dark,\" she said.\n\n\
             The owl smiled. \"Then think of them, and not of yourself.\" The little star \
             closed her eyes and thought of every child tucked into bed. Slowly, warmly, \
             she began to glow. From that night on, she was the brightest star in the sky.",
        )
        .with_summary("A shy star learns how to shine for others.")
        .with_duration_label("5 min"),
        Story::new(
            "tale-4",
            "The Brave Little Tailor",
            "Brothers Grimm",
            "Adventure",
            "A little tailor once swatted seven flies with a single blow. Proud of himself, \
             he stitched a belt that read \"Seven at one stroke.\"\n\n\
             He set out to see the world, and everyone who read his belt thought he had \
             defeated seven warriors. The king sent him to face two fearsome giants.\n\n\
             The clever tailor hid in a tree and dropped stones on the sleeping giants. \
             Each one blamed the other, and they quarrelled until both ran away. The king \
             kept his promise, and the tailor lived in the castle ever after.",
        )
        .with_summary("A clever tailor outwits giants with wit instead of strength.")
        .with_duration_label("5 min"),
        Story::new(
            "tale-5",
            "The Garden of Whispers",
            "Fabletime",
            "Nature",
            "Behind an old stone wall lay a garden where the flowers could talk. Nobody \
             had visited it for a hundred years.\n\n\
             One spring morning a girl named Lila found a rusty key in the grass. She \
             opened the gate, and the roses began to whisper hello.\n\n\
             Every day Lila watered the thirsty plants and pulled the weeds. In return the \
             flowers told her stories of kings and comets and rainy afternoons. By summer \
             the garden was blooming again, and it was never lonely anymore.",
        )
        .with_summary("A girl discovers a secret garden where flowers tell stories.")
        .with_duration_label("5 min"),
        Story::new(
            "tale-6",
            "The Lion and the Mouse",
            "Aesop",
            "Friendship",
            "A mighty lion caught a tiny mouse beneath his paw. \"Please let me go,\" \
             squeaked the mouse, \"and one day I will help you.\" The lion laughed, but he \
             let the mouse go.\n\n\
             Some days later the lion was trapped in a hunter's net. He roared and roared, \
             but he could not break free.\n\n\
             The little mouse heard him and came running. She gnawed through the ropes \
             until the lion was free. Even the smallest friend can be a great help.",
        )
        .with_summary("A tiny mouse repays the kindness of a mighty lion.")
        .with_duration_label("4 min"),
    ]
}
